// Copyright (c) 2017-2021 Fabian Schuiki

#[macro_use]
extern crate indoc;

use std::sync::Arc;
use wavetrace::{Session, SignalKind, SignalValue, TimeMode, TraceConfig, TraceError};

#[test]
fn dump_through_session() {
    let _ = env_logger::builder().is_test(true).try_init();
    let path = std::env::temp_dir().join(format!("wavetrace-{}-session.dump", std::process::id()));
    let dump = Arc::new(wavetrace::load("dump").unwrap());
    let config = TraceConfig::new(path.to_str().unwrap()).time_per_tick(1e-9);
    let mut trace = Session::create(&dump, config).unwrap();

    let en = trace.declare_signal("en", SignalKind::Bool).unwrap();
    let data = trace.declare_signal("data", SignalKind::Int(8)).unwrap();
    let vdd = trace.declare_signal("vdd", SignalKind::Analog).unwrap();
    match trace.declare_signal("ch", SignalKind::Chan(4)) {
        Err(TraceError::Unsupported(symbol)) => assert_eq!(symbol, "dump_add_chan_signal"),
        r => panic!("unexpected {:?}", r),
    }
    assert_eq!(trace.signals().len(), 3);

    trace.begin_init().unwrap();
    trace.init_value(en, false).unwrap();
    trace.init_value(data, SignalValue::int(0)).unwrap();
    trace.end_init().unwrap();
    trace.record_change(en, 1e-9, true).unwrap();
    trace.record_change(data, 1e-9, SignalValue::int(0x1ff)).unwrap();
    trace.record_change(vdd, 2e-9, 1.5).unwrap();
    trace.close().unwrap();

    assert_eq!(
        std::fs::read_to_string(&path).unwrap(),
        indoc! {"
            @0
              en = 0
              data = 0x00
            @1
              en = 1
              data = 0xff
            @2
              vdd = 1.5
        "}
    );
}

#[test]
fn dump_has_no_tick_mode() {
    let _ = env_logger::builder().is_test(true).try_init();
    let dump = Arc::new(wavetrace::load("dump").unwrap());
    let config = TraceConfig::new("unused.dump").mode(TimeMode::Tick);
    assert!(Session::create(&dump, config).is_err());
}
