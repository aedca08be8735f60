//! Criterion benchmarks for the display control frame codec.
//!
//! Measures encode and decode latency per command type.  The codec sits on
//! every monitor round trip, but the wire itself is the bottleneck; these
//! exist to catch accidental regressions, not to chase nanoseconds.
//!
//! Run with:
//! ```bash
//! cargo bench --package necme-core --bench codec_bench
//! ```

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use necme_core::protocol::codec::{decode_reply, encode_command, encode_reply};
use necme_core::{Command, CommandKind, InputTerminal, PowerMode, Reply};

// ── Fixtures ──────────────────────────────────────────────────────────────────

const MONITOR_RAW: u8 = 0x41;

fn commands() -> Vec<(&'static str, Command)> {
    vec![
        ("SetPowerOn", Command::SetPowerOn),
        ("SetPowerOff", Command::SetPowerOff),
        ("ReadPowerStatus", Command::ReadPowerStatus),
        ("ReadActiveInput", Command::ReadActiveInput),
        ("ReadInputName", Command::ReadInputName(InputTerminal(0x11))),
        ("ReadModelName", Command::ReadModelName),
        ("ReadSerialNumber", Command::ReadSerialNumber),
    ]
}

fn replies() -> Vec<(&'static str, CommandKind, Reply)> {
    vec![
        (
            "PowerSet",
            CommandKind::SetPower,
            Reply::PowerSet(PowerMode::On),
        ),
        (
            "PowerStatus",
            CommandKind::ReadPowerStatus,
            Reply::PowerStatus(PowerMode::Standby),
        ),
        (
            "ActiveInput",
            CommandKind::ReadActiveInput,
            Reply::ActiveInput(InputTerminal(0x88)),
        ),
        (
            "InputName",
            CommandKind::ReadInputName,
            Reply::InputName {
                terminal: InputTerminal(0x11),
                name: "Conference HDMI ".to_string(),
            },
        ),
        (
            "ModelName",
            CommandKind::ReadModelName,
            Reply::ModelName("ME501".to_string()),
        ),
        (
            "SerialNumber",
            CommandKind::ReadSerialNumber,
            Reply::SerialNumber("7Z00123".to_string()),
        ),
    ]
}

// ── Benchmark groups ──────────────────────────────────────────────────────────

/// Benchmarks `encode_command` for every command type.
fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode_command");
    for (name, cmd) in commands() {
        group.bench_with_input(BenchmarkId::new("cmd", name), &cmd, |b, cmd| {
            b.iter(|| encode_command(black_box(cmd), black_box(MONITOR_RAW)))
        });
    }
    group.finish();
}

/// Benchmarks `decode_reply` for every reply type (from pre-encoded bytes).
fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_reply");
    for (name, kind, reply) in replies() {
        let bytes = encode_reply(&reply, MONITOR_RAW);
        group.bench_with_input(BenchmarkId::new("reply", name), &bytes, |b, bytes| {
            b.iter(|| decode_reply(black_box(kind), black_box(bytes)).expect("decode must succeed"))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_encode, bench_decode);
criterion_main!(benches);
