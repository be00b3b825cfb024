pub mod compare;
pub mod ops_align;
pub mod ops_rules;
pub mod removal;
