#![no_main]
use libfuzzer_sys::fuzz_target;
use tank_core::event_log::{ACTION_MAX, EventLog, LogEntry, TS_MAX};

fuzz_target!(|input: (String, String, u8)| {
    let (ts, action, repeats) = input;
    let entry = LogEntry::new(&ts, &action);
    assert!(entry.ts().len() <= TS_MAX);
    assert!(entry.action().len() <= ACTION_MAX);
    assert!(!entry.action().contains('\n'));

    let mut log: EventLog<4> = EventLog::new();
    for _ in 0..repeats {
        log.append(entry.clone());
    }
    assert_eq!(log.snapshot().len(), usize::from(repeats).min(4));
});
