//! # Hook Tests
//!
//! Dispatch order, stop aggregation and what a hook can see of the session.

use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use armemu_core::cpu::Register;
use armemu_core::sim::{Hook, HookAction, HookContext, Hooks, RunOutcome, RunState};
use pretty_assertions::assert_eq;

use crate::common::harness::{BASE, BIN_SIZE, TestContext};

/// Counts invocations; implemented as a named type to exercise the `Hook` trait directly.
#[derive(Debug)]
struct Counter(Arc<AtomicUsize>);

impl Hook for Counter {
    fn on_code(&mut self, _ctx: &mut HookContext<'_>, _address: u64) -> HookAction {
        let _ = self.0.fetch_add(1, Ordering::SeqCst);
        HookAction::Continue
    }
}

#[test]
fn test_hooks_collection() {
    let mut hooks = Hooks::new();
    assert!(hooks.is_empty());
    hooks.add(Counter(Arc::new(AtomicUsize::new(0))));
    hooks.add_fn(|_, _| HookAction::Continue);
    assert_eq!(hooks.len(), 2);
}

#[test]
fn test_trait_hook_fires_per_instruction() {
    let mut ctx = TestContext::new();
    ctx.emu.dump_config_mut().enabled = false;
    let count = Arc::new(AtomicUsize::new(0));
    ctx.emu.add_hook(Counter(Arc::clone(&count)));

    let _ = ctx.emu.start(BASE as u32, (BASE + 0x20) as u32).unwrap();
    assert_eq!(count.load(Ordering::SeqCst), 8);
}

#[test]
fn test_hooks_fire_in_registration_order() {
    let mut ctx = TestContext::new();
    ctx.emu.dump_config_mut().enabled = false;
    let log = Arc::new(Mutex::new(Vec::new()));

    for id in 0..3 {
        let log = Arc::clone(&log);
        ctx.emu.on_code(move |_, address| {
            log.lock().unwrap().push((address, id));
            HookAction::Continue
        });
    }

    let _ = ctx.emu.start(BASE as u32, (BASE + 4) as u32).unwrap();
    assert_eq!(*log.lock().unwrap(), vec![(BASE, 0), (BASE, 1), (BASE, 2)]);
}

#[test]
fn test_every_hook_runs_even_after_stop() {
    let mut ctx = TestContext::new();
    let later = Arc::new(AtomicUsize::new(0));

    ctx.emu.on_code(|_, _| HookAction::Stop);
    let seen = Arc::clone(&later);
    ctx.emu.on_code(move |_, _| {
        let _ = seen.fetch_add(1, Ordering::SeqCst);
        HookAction::Continue
    });

    let outcome = ctx.emu.start(BASE as u32, (BASE + 0x10) as u32).unwrap();
    assert_eq!(outcome, RunOutcome::Stopped { pc: BASE as u32 });
    assert_eq!(later.load(Ordering::SeqCst), 1);
}

#[test]
fn test_context_stop_halts_before_instruction() {
    let mut ctx = TestContext::new();
    ctx.emu.on_code(|hook, address| {
        if address == BASE + 8 {
            assert!(hook.stop());
        }
        HookAction::Continue
    });

    let outcome = ctx.emu.start(BASE as u32, (BASE + 0x100) as u32).unwrap();
    assert_eq!(outcome, RunOutcome::Stopped { pc: (BASE + 8) as u32 });
    assert_eq!(ctx.emu.core().executed(), 2);
    assert_eq!(ctx.emu.state(), RunState::Stopped);
    assert!(!ctx.dump_dir().exists());
}

#[test]
fn test_context_reads_memory_and_registers() {
    let mut ctx = TestContext::new();
    ctx.emu.dump_config_mut().enabled = false;
    let message = BASE + BIN_SIZE - 0x100;
    ctx.emu
        .memory()
        .write_bytes(message, b"hello from r0\0")
        .unwrap();
    ctx.emu.reg_write(Register::R0, message as u32);

    let captured = Arc::new(Mutex::new(String::new()));
    let sink = Arc::clone(&captured);
    ctx.emu.on_code(move |hook, _| {
        let pointer = u64::from(hook.reg_read(Register::R0));
        *sink.lock().unwrap() = hook.read_string(pointer).unwrap();
        assert_eq!(hook.space().regions().len(), 2);
        HookAction::Continue
    });

    let _ = ctx.emu.start(BASE as u32, (BASE + 4) as u32).unwrap();
    assert_eq!(*captured.lock().unwrap(), "hello from r0");
}

#[test]
fn test_context_writes_are_visible_after_run() {
    let mut ctx = TestContext::new();
    ctx.emu.dump_config_mut().enabled = false;
    ctx.emu.on_code(|hook, address| {
        hook.reg_write(Register::R1, address as u32);
        hook.memory().write_u32(BASE + 0x800, 0xCAFE_F00D).unwrap();
        HookAction::Continue
    });

    let _ = ctx.emu.start(BASE as u32, (BASE + 8) as u32).unwrap();
    assert_eq!(ctx.emu.reg_read(Register::R1), (BASE + 4) as u32);
    assert_eq!(ctx.emu.memory().read_u32(BASE + 0x800).unwrap(), 0xCAFE_F00D);
}

#[test]
fn test_pc_redirect_skips_code() {
    let mut ctx = TestContext::new();
    ctx.emu.dump_config_mut().enabled = false;
    let last = Arc::new(AtomicU32::new(0));
    let seen = Arc::clone(&last);

    // Jump over a 0x100-byte window, as a syscall shim returning to LR would.
    ctx.emu.on_code(move |hook, address| {
        seen.store(address as u32, Ordering::SeqCst);
        if address == BASE + 4 {
            hook.reg_write(Register::Pc, (BASE + 0x104) as u32);
        }
        HookAction::Continue
    });

    let _ = ctx.emu.start(BASE as u32, (BASE + 0x108) as u32).unwrap();
    assert_eq!(ctx.emu.core().executed(), 2);
    assert_eq!(last.load(Ordering::SeqCst), (BASE + 0x104) as u32);
}
