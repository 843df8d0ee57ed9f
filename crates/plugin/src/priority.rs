//! Hook ordering

/// Priority level for hook execution (lower value = earlier execution)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct HookPriority(pub i32);

impl HookPriority {
    /// First to execute
    pub const FIRST: HookPriority = HookPriority(-1000);

    /// URL rewriting, before anything that looks at the final target
    pub const REWRITE: HookPriority = HookPriority(-100);

    /// Default
    pub const NORMAL: HookPriority = HookPriority(0);

    /// Last to execute
    pub const LAST: HookPriority = HookPriority(1000);
}

impl From<i32> for HookPriority {
    fn from(value: i32) -> Self {
        HookPriority(value)
    }
}
