//! Recording interrupt controller for host tests.
//!
//! Clones share one state, so a test keeps a handle to inspect calls and
//! simulate signals while the registry owns another.

use std::alloc::{GlobalAlloc, Layout, System};
use std::cell::Cell;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use drivers::hal::gpio::{InterruptMode, Pin};
use drivers::hal::interrupt::{
    InterruptVector, PinInterruptController, SystemInterruptController, SystemIrq,
};
use spin::Mutex;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum HalCall {
    Attach(Pin, InterruptMode),
    Detach(Pin),
    EnableAll,
    DisableAll,
    /// Line and whether a handler was installed (vs. removed).
    SetSystem(SystemIrq, bool),
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct FakeHalError;

/// How the next install request goes wrong.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Fault {
    /// Refused before anything is touched.
    Refuse,
    /// The vector is taken, then failure is reported anyway.
    Latch,
}

#[derive(Default)]
struct State {
    calls: Vec<HalCall>,
    pins: HashMap<Pin, InterruptVector>,
    system: HashMap<SystemIrq, InterruptVector>,
    gate_closed: bool,
    attach_fault: Option<Fault>,
    system_fault: Option<Fault>,
    fail_detach: bool,
    fail_unhook: bool,
}

#[derive(Clone, Default)]
pub struct FakeHal {
    state: Arc<Mutex<State>>,
}

impl FakeHal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Calls recorded that changed hardware state, in order. Gate toggles
    /// are left out so ordering checks stay about attach and detach.
    pub fn calls(&self) -> Vec<HalCall> {
        self.state
            .lock()
            .calls
            .iter()
            .copied()
            .filter(|call| !matches!(call, HalCall::EnableAll | HalCall::DisableAll))
            .collect()
    }

    pub fn is_armed(&self, pin: Pin) -> bool {
        self.state.lock().pins.contains_key(&pin)
    }

    pub fn fail_next_attach(&self) {
        self.state.lock().attach_fault = Some(Fault::Refuse);
    }

    /// The next attach arms the pin but still reports an error.
    pub fn latch_then_fail_next_attach(&self) {
        self.state.lock().attach_fault = Some(Fault::Latch);
    }

    pub fn fail_next_detach(&self) {
        self.state.lock().fail_detach = true;
    }

    pub fn fail_next_system(&self) {
        self.state.lock().system_fault = Some(Fault::Refuse);
    }

    /// The next system install takes the vector but still reports an error.
    pub fn latch_then_fail_next_system(&self) {
        self.state.lock().system_fault = Some(Fault::Latch);
    }

    /// The next system handler removal fails, leaving the vector in place.
    pub fn fail_next_unhook(&self) {
        self.state.lock().fail_unhook = true;
    }

    /// Simulate a signal on `pin`. Returns whether a vector ran.
    pub fn fire(&self, pin: Pin) -> bool {
        let vector = {
            let state = self.state.lock();
            if state.gate_closed {
                return false;
            }
            state.pins.get(&pin).copied()
        };
        Self::run(vector)
    }

    /// Simulate a system line. The pin gate does not apply.
    pub fn fire_system(&self, irq: SystemIrq) -> bool {
        let vector = self.state.lock().system.get(&irq).copied();
        Self::run(vector)
    }

    fn run(vector: Option<InterruptVector>) -> bool {
        match vector {
            Some(vector) => {
                // SAFETY: vectors are removed from the fake on detach, and
                // the registries only free contexts after that.
                unsafe { vector.fire() };
                true
            }
            None => false,
        }
    }
}

impl PinInterruptController for FakeHal {
    type Error = FakeHalError;

    fn attach(
        &mut self,
        pin: Pin,
        vector: InterruptVector,
        mode: InterruptMode,
    ) -> Result<(), Self::Error> {
        let mut state = self.state.lock();
        let fault = state.attach_fault.take();
        if fault == Some(Fault::Refuse) {
            return Err(FakeHalError);
        }
        state.calls.push(HalCall::Attach(pin, mode));
        state.pins.insert(pin, vector);
        match fault {
            Some(_) => Err(FakeHalError),
            None => Ok(()),
        }
    }

    fn detach(&mut self, pin: Pin) -> Result<(), Self::Error> {
        let mut state = self.state.lock();
        if core::mem::take(&mut state.fail_detach) {
            return Err(FakeHalError);
        }
        state.calls.push(HalCall::Detach(pin));
        state.pins.remove(&pin);
        Ok(())
    }

    fn enable_all(&mut self) -> Result<(), Self::Error> {
        let mut state = self.state.lock();
        state.calls.push(HalCall::EnableAll);
        state.gate_closed = false;
        Ok(())
    }

    fn disable_all(&mut self) -> Result<(), Self::Error> {
        let mut state = self.state.lock();
        state.calls.push(HalCall::DisableAll);
        state.gate_closed = true;
        Ok(())
    }
}

impl SystemInterruptController for FakeHal {
    type Error = FakeHalError;

    fn set_system_handler(
        &mut self,
        irq: SystemIrq,
        vector: Option<InterruptVector>,
    ) -> Result<(), Self::Error> {
        let mut state = self.state.lock();
        match vector {
            Some(vector) => {
                let fault = state.system_fault.take();
                if fault == Some(Fault::Refuse) {
                    return Err(FakeHalError);
                }
                state.calls.push(HalCall::SetSystem(irq, true));
                state.system.insert(irq, vector);
                match fault {
                    Some(_) => Err(FakeHalError),
                    None => Ok(()),
                }
            }
            None => {
                if core::mem::take(&mut state.fail_unhook) {
                    return Err(FakeHalError);
                }
                state.calls.push(HalCall::SetSystem(irq, false));
                state.system.remove(&irq);
                Ok(())
            }
        }
    }
}

/// Counts how often its callbacks ran and how many of them were dropped.
#[derive(Clone, Default)]
pub struct Tracked {
    hits: Arc<AtomicUsize>,
    drops: Arc<AtomicUsize>,
}

struct DropGuard(Arc<AtomicUsize>);

impl DropGuard {
    fn keep(&self) {}
}

impl Drop for DropGuard {
    fn drop(&mut self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

impl Tracked {
    pub fn new() -> Self {
        Self::default()
    }

    /// A fresh callback bumping `hits`; bumps `drops` when released.
    pub fn callback(&self) -> impl FnMut() + Send + 'static {
        let hits = self.hits.clone();
        let guard = DropGuard(self.drops.clone());
        move || {
            guard.keep();
            hits.fetch_add(1, Ordering::SeqCst);
        }
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    pub fn drops(&self) -> usize {
        self.drops.load(Ordering::SeqCst)
    }
}

/// System allocator that can be made to fail, one thread at a time.
struct FallibleAlloc;

thread_local! {
    static OUT_OF_MEMORY: Cell<bool> = const { Cell::new(false) };
}

unsafe impl GlobalAlloc for FallibleAlloc {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        if OUT_OF_MEMORY.try_with(Cell::get).unwrap_or(false) {
            return std::ptr::null_mut();
        }
        unsafe { System.alloc(layout) }
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        unsafe { System.dealloc(ptr, layout) }
    }
}

#[global_allocator]
static ALLOCATOR: FallibleAlloc = FallibleAlloc;

/// Run `f` with every heap allocation on the calling thread failing.
pub fn out_of_memory<R>(f: impl FnOnce() -> R) -> R {
    OUT_OF_MEMORY.with(|flag| flag.set(true));
    let result = f();
    OUT_OF_MEMORY.with(|flag| flag.set(false));
    result
}
