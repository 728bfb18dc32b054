use core::fmt::Debug;

/// CPU-level interrupt masking.
///
/// Implemented once per architecture. Everything that shares state with
/// interrupt context on a single core builds on these two operations.
pub trait IrqControl {
    /// Interrupt state captured by [`IrqControl::disable`].
    type State: Copy + Debug;

    /// Mask interrupts on the current CPU and return the previous state.
    fn disable() -> Self::State;

    /// Put the interrupt state back to what `disable` captured.
    fn restore(state: Self::State);
}
