use libsig::config::{BoundSpec, RecordDirection, RecordMode, TrackerConfig};
use libsig::domain::{Address, ReplayError};
use libsig::replay::{parse_trace, replay, ReplayHost};
use libsig::symbolization::{load_symbol_names, write_symbol_names, SymbolPool, Symbolizer};
use libsig::Tracker;
use std::fs;
use std::io::BufReader;

const TRACE: &str = "\
# two threads, one signal handler
pid 777
start
exec 1 0x1000
exec 1 0x7000
exec 2 0x1004
exec 2 0x7100
signal 1
exec 1 0x7200
exec 1 0x1008
sigreturn 1
exec 1 0x7000
";

#[test]
fn test_replay_trace_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let trace_path = dir.path().join("run.trace");
    fs::write(&trace_path, TRACE).unwrap();

    let config = TrackerConfig {
        bound: Some(BoundSpec { addr: Address(0x1000), length: 0x10 }),
        records_file: Some(dir.path().join("sig-%p.out").to_string_lossy().into_owned()),
        mode: RecordMode::new(RecordDirection::Both, true),
        ..TrackerConfig::default()
    };

    let events = parse_trace(BufReader::new(fs::File::open(&trace_path).unwrap())).unwrap();
    let host = ReplayHost::new();
    let mut tracker = Tracker::new(&config).unwrap();

    let stats = replay(&mut tracker, &host, events).unwrap();
    assert_eq!(stats.events, 11);
    assert_eq!(stats.executed, 7);
    assert_eq!(stats.signals, 1);

    let report = tracker.finish(&host).unwrap();
    let path = report.output.unwrap();
    assert_eq!(path, dir.path().join("sig-777.out"));

    // The handler starts with no region, so 0x7200 is recorded even though
    // thread 1 was already outbound; after sigreturn thread 1 is outbound
    // again and 0x7000 is not a transition.
    let records = fs::read_to_string(path).unwrap();
    assert_eq!(
        records,
        "# Thread: 1\n\
         0x1000,???,inbound\n\
         0x7000,???,outbound\n\
         0x7200,???,outbound\n\
         0x1008,???,inbound\n\
         # Thread: 2\n\
         0x1004,???,inbound\n\
         0x7100,???,outbound\n"
    );
}

#[test]
fn test_replay_start_without_range_fails() {
    let events = parse_trace("start\n".as_bytes()).unwrap();
    let host = ReplayHost::new();
    let mut tracker = Tracker::new(&TrackerConfig::default()).unwrap();

    let result = replay(&mut tracker, &host, events);
    assert!(matches!(result, Err(ReplayError::Tracker(_))));
}

#[test]
fn test_symbols_round_trip_through_bootstrap_file() {
    let binary_path = env!("CARGO_BIN_EXE_libsig");
    let symbolizer = Symbolizer::new(binary_path).expect("Failed to create symbolizer");
    assert!(!symbolizer.symbols().is_empty(), "test binary has no function symbols");

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("libsig.syms");
    let file = fs::File::create(&path).unwrap();
    let written = write_symbol_names(
        file,
        symbolizer.symbols().iter().map(|sym| (sym.addr, sym.name.as_str())),
    )
    .unwrap();
    assert_eq!(written, symbolizer.symbols().len());

    let mut pool = SymbolPool::new();
    let loaded = load_symbol_names(&mut pool, &path).unwrap();
    assert_eq!(loaded, written);

    let first = &symbolizer.symbols()[0];
    let handle = pool.lookup(Address(first.addr)).unwrap().expect("symbol not interned");
    assert_eq!(pool.name_of(handle), Some(first.name.as_str()));
    pool.destroy().unwrap();
}

#[test]
fn test_symbolizer_names_its_own_functions() {
    let binary_path = env!("CARGO_BIN_EXE_libsig");
    let symbolizer = Symbolizer::new(binary_path).expect("Failed to create symbolizer");

    let resolved = symbolizer
        .symbols()
        .iter()
        .take(20)
        .filter_map(|sym| symbolizer.function_name(sym.addr))
        .count();
    assert!(resolved > 0, "no symbol address resolved to a name");
}
