pub(crate) mod table;
pub(crate) mod variable;
