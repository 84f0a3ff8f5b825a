use crate::dashboard::variable::{Variable, VariableDef, VariableValue};
use crate::foundation::error::{FxError, FxResult};

/// The hosting script's parameters, in definition order.
///
/// The dashboard reads [`ParameterTable::variables`] to lay out its controls and writes edits
/// back through [`ParameterTable::set`]. Reloading the script calls [`ParameterTable::define`]
/// again; values the user already edited survive whenever the new definition is compatible.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize)]
pub struct ParameterTable {
    vars: Vec<Variable>,
}

impl ParameterTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the table with a fresh set of definitions.
    ///
    /// Each new variable inherits the value of the previous variable with the same name. Duplicate
    /// names are rejected and leave the table untouched.
    #[tracing::instrument(level = "debug", skip_all, fields(previous = self.vars.len()))]
    pub fn define(&mut self, vars: impl IntoIterator<Item = Variable>) -> FxResult<()> {
        let mut next: Vec<Variable> = Vec::new();
        for var in vars {
            if next.iter().any(|v| v.name() == var.name()) {
                return Err(FxError::invalid_variable(format!(
                    "variable \"{}\" is defined more than once",
                    var.name()
                )));
            }
            next.push(var);
        }

        let mut inherited = 0usize;
        for var in &mut next {
            if let Some(old) = self.variable(var.name()) {
                var.inherit(old);
                inherited += 1;
            }
        }
        tracing::debug!(defined = next.len(), inherited, "parameter table reloaded");
        self.vars = next;
        Ok(())
    }

    /// [`ParameterTable::define`] from wire descriptions. Nothing changes if any of them is
    /// invalid.
    pub fn define_defs(&mut self, defs: impl IntoIterator<Item = VariableDef>) -> FxResult<()> {
        let vars = defs
            .into_iter()
            .map(Variable::try_from)
            .collect::<FxResult<Vec<_>>>()?;
        self.define(vars)
    }

    /// Parse a JSON array of [`VariableDef`]s and define them.
    pub fn define_json(&mut self, json: &str) -> FxResult<()> {
        let defs: Vec<VariableDef> = serde_json::from_str(json)
            .map_err(|e| FxError::invalid_variable(format!("malformed variable list: {e}")))?;
        self.define_defs(defs)
    }

    pub fn variables(&self) -> &[Variable] {
        &self.vars
    }

    pub fn variable(&self, name: &str) -> Option<&Variable> {
        self.vars.iter().find(|v| v.name() == name)
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn get(&self, name: &str) -> FxResult<VariableValue> {
        self.variable(name)
            .map(Variable::value)
            .ok_or_else(|| unknown(name))
    }

    /// Store a value coming back from the dashboard. It is validated like any other assignment.
    pub fn set(&mut self, name: &str, value: impl Into<VariableValue>) -> FxResult<()> {
        let var = self
            .vars
            .iter_mut()
            .find(|v| v.name() == name)
            .ok_or_else(|| unknown(name))?;
        var.set_value(value)?;
        tracing::debug!(name, "variable updated");
        Ok(())
    }
}

fn unknown(name: &str) -> FxError {
    FxError::invalid_variable(format!("no variable named \"{name}\""))
}

#[cfg(test)]
#[path = "../../tests/unit/dashboard/table.rs"]
mod tests;
