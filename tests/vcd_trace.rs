// Copyright (c) 2017-2021 Fabian Schuiki

#[macro_use]
extern crate indoc;

use std::{path::PathBuf, sync::Arc};
use wavetrace::{
    vcd::identifier, BackendDescriptor, ChannelState, Session, SessionState, SignalKind,
    SignalValue, TimeMode, TraceConfig, WideValue,
};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("wavetrace-{}-{}", std::process::id(), name))
}

fn vcd() -> Arc<BackendDescriptor> {
    Arc::new(wavetrace::load("vcd").unwrap())
}

/// Everything after the header, which carries the current date.
fn body(path: &PathBuf) -> String {
    let text = std::fs::read_to_string(path).unwrap();
    let start = text.find("$scope").unwrap();
    text[start..].to_owned()
}

#[test]
fn bool_and_int() {
    init_logger();
    let path = temp_path("bool_and_int.vcd");
    let config = TraceConfig::new(path.to_str().unwrap()).time_per_tick(1e-9);
    let mut trace = Session::create(&vcd(), config).unwrap();
    let a = trace.declare_signal("a", SignalKind::Bool).unwrap();
    let b = trace.declare_signal("b", SignalKind::Int(4)).unwrap();
    trace.begin_init().unwrap();
    trace.end_init().unwrap();
    trace.record_change(a, 0.0, true).unwrap();
    trace.record_change(b, 1e-9, SignalValue::int(10)).unwrap();
    trace.close().unwrap();

    let text = body(&path);
    assert_eq!(
        text,
        indoc! {"
            $scope module top $end
            $var wire 1 ! a $end
            $var wire 4 \" b $end
            $upscope $end
            $enddefinitions $end
            $dumpvars
            $end
            #0
            b1 !
            #1
            b1010 \"
        "}
    );
    assert_eq!(text.lines().filter(|l| l.starts_with('#')).count(), 2);
}

#[test]
fn header_preamble() {
    init_logger();
    let path = temp_path("header_preamble.vcd");
    let config = TraceConfig::new(path.to_str().unwrap()).time_per_tick(3.7e-9);
    let mut trace = Session::create(&vcd(), config).unwrap();
    trace.begin_init().unwrap();
    trace.end_init().unwrap();
    trace.close().unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.starts_with("$date\n"));
    assert!(text.contains("$version\n"));
    assert!(text.contains("   actual timescale is 3.7e-09.\n"));
    assert!(text.contains("$timescale 10 ns $end\n"));
}

#[test]
fn init_values_carry_no_time() {
    init_logger();
    let path = temp_path("init_values.vcd");
    let config = TraceConfig::new(path.to_str().unwrap()).time_per_tick(1e-9);
    let mut trace = Session::create(&vcd(), config).unwrap();
    let x = trace.declare_signal("x", SignalKind::Analog).unwrap();
    let y = trace.declare_signal("y", SignalKind::Int(3)).unwrap();
    trace.begin_init().unwrap();
    trace.init_value(x, 0.5).unwrap();
    trace.init_value(y, SignalValue::int(5)).unwrap();
    assert_eq!(trace.state(), SessionState::InInit);
    trace.end_init().unwrap();
    trace.record_change(x, 2e-9, -1.25).unwrap();
    trace.close().unwrap();

    assert!(body(&path).ends_with(indoc! {"
        $dumpvars
        r0.5 !
        b101 \"
        $end
        #2
        r-1.25 !
    "}));
}

#[test]
fn natural_declaration_order() {
    init_logger();
    let path = temp_path("natural_order.vcd");
    let mut trace = Session::create(&vcd(), TraceConfig::new(path.to_str().unwrap())).unwrap();
    for name in &["sig[2]", "sig[10]", "sig[1]"] {
        trace.declare_signal(name, SignalKind::Bool).unwrap();
    }
    trace.begin_init().unwrap();
    trace.end_init().unwrap();
    trace.close().unwrap();

    let vars: Vec<_> = body(&path)
        .lines()
        .filter(|l| l.starts_with("$var"))
        .map(|l| l.to_owned())
        .collect();
    assert_eq!(
        vars,
        vec![
            "$var wire 1 # sig[1] $end",
            "$var wire 1 ! sig[2] $end",
            "$var wire 1 \" sig[10] $end",
        ]
    );
}

#[test]
fn identifiers_follow_declaration_order() {
    init_logger();
    let path = temp_path("identifiers.vcd");
    let mut trace = Session::create(&vcd(), TraceConfig::new(path.to_str().unwrap())).unwrap();
    for i in 0..95 {
        trace
            .declare_signal(&format!("s{:03}", i), SignalKind::Bool)
            .unwrap();
    }
    trace.begin_init().unwrap();
    trace.end_init().unwrap();
    trace.close().unwrap();

    let idents: Vec<String> = body(&path)
        .lines()
        .filter(|l| l.starts_with("$var"))
        .map(|l| l.split_whitespace().nth(3).unwrap().to_owned())
        .collect();
    assert_eq!(idents.len(), 95);
    for (i, id) in idents.iter().enumerate() {
        assert_eq!(*id, identifier(i));
    }
    assert!(idents[..94].iter().all(|id| id.len() == 1));
    assert!(idents[..94].windows(2).all(|w| w[0] < w[1]));
    assert_eq!(idents[94].len(), 2);
}

#[test]
fn channel_states() {
    init_logger();
    let path = temp_path("channel_states.vcd");
    let config = TraceConfig::new(path.to_str().unwrap()).time_per_tick(1e-9);
    let mut trace = Session::create(&vcd(), config).unwrap();
    let c = trace.declare_signal("c", SignalKind::Chan(3)).unwrap();
    trace.begin_init().unwrap();
    trace.end_init().unwrap();
    trace.change_chan(c, 0.0, ChannelState::Idle).unwrap();
    trace.change_chan(c, 1e-9, ChannelState::SendBlocked).unwrap();
    trace.change_chan(c, 2e-9, ChannelState::value(5)).unwrap();
    trace.close().unwrap();

    let text = body(&path);
    assert!(text.contains("$var wire 4 ! c $end\n"));
    let patterns: Vec<_> = text
        .lines()
        .filter(|l| l.starts_with('b'))
        .map(|l| l.split_whitespace().next().unwrap()[1..].to_owned())
        .collect();
    assert_eq!(patterns, vec!["zz00", "zz10", "1000"]);
    assert!(patterns[..2].iter().all(|p| p != "1000"));
}

#[test]
fn tick_mode() {
    init_logger();
    let path = temp_path("tick_mode.vcd");
    let config = TraceConfig::new(path.to_str().unwrap()).mode(TimeMode::Tick);
    let mut trace = Session::create(&vcd(), config).unwrap();
    let w = trace.declare_signal("w", SignalKind::Int(72)).unwrap();
    trace.begin_init().unwrap();
    trace.end_init().unwrap();
    let big = WideValue::from_words(72, &[0, 0x80]);
    trace.record_change(w, 0u64, SignalValue::int(1)).unwrap();
    trace.record_change(w, 0u64, SignalValue::int(2)).unwrap();
    trace
        .change_wide_digital(w, WideValue::from_words(65, &[5, 1]), big)
        .unwrap();
    trace.close().unwrap();

    let text = body(&path);
    let lines: Vec<_> = text.lines().skip_while(|l| *l != "#0").collect();
    assert_eq!(lines.len(), 5);
    assert_eq!(lines[1], format!("b{}1 !", "0".repeat(71)));
    assert_eq!(lines[2], format!("b{}10 !", "0".repeat(70)));
    assert_eq!(lines[3], "#18446744073709551621");
    assert_eq!(lines[4], format!("b1{} !", "0".repeat(71)));
}

#[test]
fn read_back() {
    init_logger();
    let path = temp_path("read_back.vcd");
    let name = path.to_str().unwrap();
    let config = TraceConfig::new(name).time_per_tick(1e-9);
    let vcd = vcd();
    let mut trace = Session::create(&vcd, config).unwrap();
    let clk = trace.declare_signal("clk", SignalKind::Bool).unwrap();
    let cnt = trace.declare_signal("cnt", SignalKind::Int(8)).unwrap();
    let v = trace.declare_signal("v", SignalKind::Analog).unwrap();
    trace.begin_init().unwrap();
    trace.init_value(clk, false).unwrap();
    trace.init_value(cnt, SignalValue::int(0)).unwrap();
    trace.init_value(v, 0.0).unwrap();
    trace.end_init().unwrap();
    for i in 1..=4u64 {
        let t = i as f64 * 1e-9;
        trace.record_change(clk, t, i % 2 == 1).unwrap();
        trace.record_change(cnt, t, SignalValue::int(i)).unwrap();
    }
    trace.record_change(v, 4e-9, 1.8).unwrap();
    trace.close().unwrap();

    let mut trace = Session::open(&vcd, name, TimeMode::Real).unwrap();
    assert!(trace.is_read_only());
    assert_eq!(trace.state(), SessionState::Streaming);
    let header = trace.header().unwrap();
    assert_eq!(header.time_per_tick, 1e-9);
    assert!((header.stop_time - 4e-9).abs() < 1e-18);

    let clk = trace.lookup("clk").unwrap().unwrap();
    let cnt = trace.lookup("cnt").unwrap().unwrap();
    let v = trace.lookup("v").unwrap().unwrap();
    assert_eq!(trace.lookup("nope").unwrap(), None);
    assert_eq!(trace.signal_kind(cnt).unwrap(), SignalKind::Int(8));
    assert_eq!(trace.signal_kind(v).unwrap(), SignalKind::Analog);
    assert_eq!(trace.value(cnt).unwrap(), SignalValue::int(0));

    trace.advance(2).unwrap();
    assert_eq!(trace.value(clk).unwrap(), SignalValue::from(false));
    assert_eq!(trace.value(cnt).unwrap(), SignalValue::int(2));
    trace.advance_by(2e-9).unwrap();
    assert_eq!(trace.value(cnt).unwrap(), SignalValue::int(4));
    assert_eq!(trace.value(v).unwrap(), SignalValue::Analog(1.8));
    assert!(!trace.has_more_data().unwrap());
    trace.close().unwrap();
    assert_eq!(trace.state(), SessionState::Closed);
}

#[test]
fn reals_read_back_unchanged() {
    init_logger();
    let path = temp_path("reals.vcd");
    let name = path.to_str().unwrap();
    let vcd = vcd();
    let mut trace = Session::create(&vcd, TraceConfig::new(name).time_per_tick(1e-9)).unwrap();
    let x = trace.declare_signal("x", SignalKind::Analog).unwrap();
    let values = [0.1 + 0.2, 1.0 / 3.0, -4.5e-12, 6.02214076e23];
    trace.begin_init().unwrap();
    trace.init_value(x, values[0]).unwrap();
    trace.end_init().unwrap();
    for (i, &v) in values[1..].iter().enumerate() {
        trace.record_change(x, (i + 1) as f64 * 1e-9, v).unwrap();
    }
    trace.close().unwrap();
    assert!(body(&path).contains("r0.30000000000000004 !\n"));

    let mut trace = Session::open(&vcd, name, TimeMode::Real).unwrap();
    let x = trace.lookup("x").unwrap().unwrap();
    for (i, &v) in values.iter().enumerate() {
        if i > 0 {
            trace.advance(1).unwrap();
        }
        let read = trace.value(x).unwrap();
        assert_eq!(read.get_analog(), Some(v));
        assert_eq!(read.get_int(), None);
    }
    trace.close().unwrap();
}
