//! A full Cypher statement and its parameter map.

use std::fmt;
use std::sync::OnceLock;

use super::clauses::Clause;
use super::entities::ParamMap;
use super::literal::RenderMode;

/// Executes rendered statement text against some database session.
///
/// Nothing in this crate implements it; callers plug in their driver.
pub trait StatementRunner {
    type Output;
    type Error;

    fn run(&self, text: &str, params: &ParamMap) -> Result<Self::Output, Self::Error>;
}

/// An ordered sequence of clauses rendered as one statement.
///
/// Whether property values render inline or as `$var` placeholders is decided
/// here, once, and handed down to every clause at render time.
#[derive(Debug, Clone)]
pub struct Statement {
    clauses: Vec<Clause>,
    terminate: bool,
    use_params: bool,
    params: OnceLock<ParamMap>,
}

impl Statement {
    pub fn new(clauses: Vec<Clause>) -> Self {
        Statement {
            clauses,
            terminate: false,
            use_params: false,
            params: OnceLock::new(),
        }
    }

    /// Append `;` to the rendered text.
    pub fn terminated(mut self, terminate: bool) -> Self {
        self.terminate = terminate;
        self
    }

    /// Render property values as `$var` placeholders.
    pub fn with_params(mut self, use_params: bool) -> Self {
        self.use_params = use_params;
        self
    }

    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    pub fn use_params(&self) -> bool {
        self.use_params
    }

    pub fn mode(&self) -> RenderMode {
        RenderMode::from_use_params(self.use_params)
    }

    pub fn render(&self) -> String {
        self.render_with(self.mode())
    }

    /// Render in an explicit mode, ignoring the statement's own flag.
    pub fn render_with(&self, mode: RenderMode) -> String {
        let mut text = self
            .clauses
            .iter()
            .map(|c| c.render(mode))
            .collect::<Vec<_>>()
            .join(" ");
        if self.terminate {
            text.push(';');
        }
        text
    }

    /// Property variable to value for every property the statement renders
    /// as a placeholder. Computed once.
    pub fn params(&self) -> &ParamMap {
        self.params.get_or_init(|| {
            let mut params = ParamMap::new();
            for clause in &self.clauses {
                clause.collect_params(&mut params);
            }
            params
        })
    }

    /// Render and hand the text plus parameters to `runner`.
    pub fn run_with<R: StatementRunner>(&self, runner: &R) -> Result<R::Output, R::Error> {
        let text = self.render();
        log::debug!("running statement: {}", text);
        if self.use_params {
            runner.run(&text, self.params())
        } else {
            runner.run(&text, &ParamMap::new())
        }
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.render())
    }
}
