use std::{
    cell::RefCell,
    collections::HashMap,
    rc::Rc,
};
use crate::{
    error::{Error, Result},
    token::Token,
    value::Value,
};

/// One lexical scope. `values` only ever holds names declared directly in this
/// scope; everything else is found by walking `enclosing`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Environment {
    enclosing: Option<Rc<RefCell<Environment>>>,
    values: HashMap<String, Value>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from(e: &Rc<RefCell<Environment>>) -> Self {
        Self { enclosing: Some(Rc::clone(e)), values: HashMap::new() }
    }

    pub fn enclosing(&self) -> Option<Rc<RefCell<Environment>>> {
        self.enclosing.clone()
    }

    pub fn get(&self, name: &Token) -> Result<Value> {
        match self.values.get(&name.lexeme) {
            Some(value) => Ok(value.clone()),
            None => match &self.enclosing {
                Some(enclosing) => enclosing.borrow().get(name),
                None => Err(Error::undefined_variable(name)),
            },
        }
    }

    pub fn assign(&mut self, name: &Token, value: Value) -> Result<()> {
        match self.values.get_mut(&name.lexeme) {
            Some(slot) => {
                *slot = value;
                Ok(())
            },
            None => match &self.enclosing {
                Some(enclosing) => enclosing.borrow_mut().assign(name, value),
                None => Err(Error::undefined_variable(name)),
            },
        }
    }

    /// Binds `name` here, replacing any binding of the same name in this scope
    /// and hiding any in the enclosing ones.
    pub fn declare<S: Into<String>>(&mut self, name: S, value: Value) {
        self.values.insert(name.into(), value);
    }
}
