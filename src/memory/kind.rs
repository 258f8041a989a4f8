//! The closed enumeration of built-in pool kinds.
//!
//! One entry per kernel object type that gets a permanently reserved slot in
//! the manager's pool array. Adding a pooled kind means adding a variant here
//! and one `init_pool` call at the owning subsystem's startup; the variant
//! order is the pool array layout, so new kinds go at the end.

/// Built-in pool kinds, one per hot kernel object type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(usize)]
pub enum PoolKind {
    // Symbol variants.
    FloatConstant,
    IntConstant,
    StringConstant,
    Variable,
    Identifier,

    // Working memory.
    Wme,
    Preference,
    Slot,

    // Rules.
    Condition,
    Test,
    Production,
    Instantiation,

    // Match network internals.
    ReteNode,
    ReteTest,
    Token,
    RightMemory,
    NodeVarNames,

    // Learning bookkeeping.
    RlInfo,
    ActivationRecord,
    EpisodicTrace,
    SemanticEntry,

    // Explanation bookkeeping.
    Attachment,
    Constraint,
}

impl PoolKind {
    pub const COUNT: usize = 23;

    pub const ALL: [PoolKind; Self::COUNT] = [
        PoolKind::FloatConstant,
        PoolKind::IntConstant,
        PoolKind::StringConstant,
        PoolKind::Variable,
        PoolKind::Identifier,
        PoolKind::Wme,
        PoolKind::Preference,
        PoolKind::Slot,
        PoolKind::Condition,
        PoolKind::Test,
        PoolKind::Production,
        PoolKind::Instantiation,
        PoolKind::ReteNode,
        PoolKind::ReteTest,
        PoolKind::Token,
        PoolKind::RightMemory,
        PoolKind::NodeVarNames,
        PoolKind::RlInfo,
        PoolKind::ActivationRecord,
        PoolKind::EpisodicTrace,
        PoolKind::SemanticEntry,
        PoolKind::Attachment,
        PoolKind::Constraint,
    ];

    /// Stable position of this kind in the manager's pool array.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Conventional pool name for this kind, used when the owning subsystem
    /// does not supply its own.
    pub fn label(self) -> &'static str {
        match self {
            PoolKind::FloatConstant => "float constant",
            PoolKind::IntConstant => "int constant",
            PoolKind::StringConstant => "str constant",
            PoolKind::Variable => "variable",
            PoolKind::Identifier => "identifier",
            PoolKind::Wme => "wme",
            PoolKind::Preference => "preference",
            PoolKind::Slot => "slot",
            PoolKind::Condition => "condition",
            PoolKind::Test => "test",
            PoolKind::Production => "production",
            PoolKind::Instantiation => "instantiation",
            PoolKind::ReteNode => "rete node",
            PoolKind::ReteTest => "rete test",
            PoolKind::Token => "token",
            PoolKind::RightMemory => "right memory",
            PoolKind::NodeVarNames => "node varnames",
            PoolKind::RlInfo => "rl info",
            PoolKind::ActivationRecord => "activation record",
            PoolKind::EpisodicTrace => "episodic trace",
            PoolKind::SemanticEntry => "semantic entry",
            PoolKind::Attachment => "attachment",
            PoolKind::Constraint => "constraint",
        }
    }
}
