use crate::context::RenderContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetPhase {
    /// Release GPU resources; CPU-side configuration is preserved.
    Pre,
    /// Recreate GPU resources from the retained configuration.
    Post,
}

/// Two-phase device-loss recovery contract.
///
/// The host application owns the orchestration: it keeps an ordered list of
/// its resource-owning objects, calls `reset(.., Pre)` on each before the
/// device goes away and `reset(.., Post)` on each afterwards. This crate
/// never triggers a reset on its own.
pub trait Resettable {
    /// Returns `false` if recreation failed; the object is then unusable
    /// until a further `Post` reset succeeds.
    fn reset(&mut self, ctx: &RenderContext, phase: ResetPhase) -> bool;
}

/// Runs one reset phase over an ordered list of resettables. Returns `false`
/// if any of them failed; the remaining entries are still visited so partial
/// recovery doesn't leave later objects untouched.
pub fn reset_all(
    ctx: &RenderContext,
    phase: ResetPhase,
    items: &mut [&mut dyn Resettable],
) -> bool {
    let mut ok = true;
    for item in items.iter_mut() {
        ok &= item.reset(ctx, phase);
    }
    ok
}
