use crate::sync::irq::IrqControl;

/// Stand-in for hosted builds, where there is no interrupt context to
/// mask against. Lets hardware-independent code run under `cargo test`.
pub struct HostIrq;

impl IrqControl for HostIrq {
    type State = ();

    #[inline(always)]
    fn disable() {}

    #[inline(always)]
    fn restore(_: ()) {}
}
