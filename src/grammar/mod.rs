pub mod context;
pub mod engine;
pub mod rule;
pub mod symbol;

pub use context::{is_prefixed_by, is_suffixed_by, skip_bracket_backward, skip_bracket_forward};
pub use engine::LSystem;
pub use rule::{Rule, RuleIndex, RuleRecord};
pub use symbol::{Sequence, Symbol, SymbolEncoding};
