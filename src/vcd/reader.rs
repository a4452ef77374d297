// Copyright (c) 2017-2021 Fabian Schuiki

use crate::{
    backend::{NodeRef, TraceHeader, TraceReader},
    error::{Result, TraceError},
    signal::SignalKind,
    table::Table,
    value::{parse_bit_string, BoolValue, SignalValue, TimeMode, Timescale, WideValue},
};
use num::{BigUint, ToPrimitive};
use std::{collections::HashMap, io::Read};

#[derive(Debug)]
struct Var {
    name: String,
    kind: SignalKind,
    value: SignalValue,
}

/// The changes recorded under one time marker.
#[derive(Debug)]
struct Step {
    ticks: WideValue,
    changes: Vec<(NodeRef, SignalValue)>,
}

/// A reader for VCD traces.
///
/// The whole trace is parsed when the reader is created. The cursor starts
/// at the initial values; each step of `advance_time` applies the changes
/// recorded under the next time marker.
#[derive(Debug)]
pub struct VcdReader {
    mode: TimeMode,
    timescale: Timescale,
    vars: Table<NodeRef, Var>,
    names: HashMap<String, NodeRef>,
    steps: Vec<Step>,
    position: usize,
    cursor: f64,
}

fn parse_error<T>(line: usize, message: impl Into<String>) -> Result<T> {
    Err(TraceError::Parse {
        line,
        message: message.into(),
    })
}

/// Collect the tokens up to the next `$end`.
fn section<'a, I>(tokens: &mut I, line: usize, keyword: &str) -> Result<Vec<&'a str>>
where
    I: Iterator<Item = (usize, &'a str)>,
{
    let mut body = Vec::new();
    for (_, tok) in tokens {
        if tok == "$end" {
            return Ok(body);
        }
        body.push(tok);
    }
    parse_error(line, format!("unterminated `{}`", keyword))
}

fn initial_value(kind: SignalKind) -> SignalValue {
    match kind {
        SignalKind::Bool => SignalValue::Bool(BoolValue::X),
        SignalKind::Int(w) | SignalKind::Chan(w) => SignalValue::Int(WideValue::zero(w)),
        SignalKind::Analog => SignalValue::Analog(0.0),
    }
}

impl VcdReader {
    /// Read and parse a trace from `input`.
    pub fn from_reader<R: Read>(mut input: R, mode: TimeMode) -> Result<Self> {
        let mut text = String::new();
        input.read_to_string(&mut text)?;
        Self::parse(&text, mode)
    }

    /// Parse a trace.
    pub fn parse(text: &str, mode: TimeMode) -> Result<Self> {
        let mut reader = VcdReader {
            mode,
            timescale: Timescale::quantize(1.0),
            vars: Table::new(),
            names: HashMap::new(),
            steps: Vec::new(),
            position: 0,
            cursor: 0.0,
        };
        let mut idents: HashMap<&str, Vec<NodeRef>> = HashMap::new();
        let mut tokens = text
            .lines()
            .enumerate()
            .flat_map(|(i, l)| l.split_whitespace().map(move |t| (i + 1, t)));

        while let Some((line, tok)) = tokens.next() {
            match tok {
                "$timescale" => {
                    let body = section(&mut tokens, line, tok)?.join(" ");
                    reader.timescale = match Timescale::parse(&body) {
                        Some(ts) => ts,
                        None => return parse_error(line, format!("invalid timescale `{}`", body)),
                    };
                }
                "$var" => {
                    let body = section(&mut tokens, line, tok)?;
                    if body.len() < 4 {
                        return parse_error(line, "incomplete `$var`");
                    }
                    let width: usize = match body[1].parse() {
                        Ok(w) => w,
                        Err(_) => return parse_error(line, format!("invalid width `{}`", body[1])),
                    };
                    let kind = match (body[0], width) {
                        ("real", _) => SignalKind::Analog,
                        (_, 1) => SignalKind::Bool,
                        (_, w) => SignalKind::Int(w),
                    };
                    let node = reader.vars.add(Var {
                        name: body[3].to_owned(),
                        kind,
                        value: initial_value(kind),
                    });
                    reader.names.insert(body[3].to_owned(), node);
                    idents.entry(body[2]).or_insert_with(Vec::new).push(node);
                }
                "$dumpvars" | "$dumpall" | "$dumpon" | "$dumpoff" | "$end" => (),
                t if t.starts_with('$') => {
                    section(&mut tokens, line, tok)?;
                }
                t if t.starts_with('#') => {
                    let ticks = match BigUint::parse_bytes(t[1..].as_bytes(), 10) {
                        Some(v) => v,
                        None => return parse_error(line, format!("invalid time `{}`", t)),
                    };
                    let width = (ticks.bits() as usize).max(1);
                    reader.steps.try_reserve(1)?;
                    reader.steps.push(Step {
                        ticks: WideValue::from_biguint(width, &ticks),
                        changes: Vec::new(),
                    });
                }
                t => {
                    let (value, ident) = match t.as_bytes()[0] {
                        b'b' | b'B' | b'r' | b'R' => match tokens.next() {
                            Some((_, ident)) => (t, ident),
                            None => return parse_error(line, format!("missing identifier after `{}`", t)),
                        },
                        _ => t.split_at(t.chars().next().map_or(1, char::len_utf8)),
                    };
                    let nodes = match idents.get(ident) {
                        Some(nodes) => nodes,
                        None => return parse_error(line, format!("unknown identifier `{}`", ident)),
                    };
                    for &node in nodes {
                        let value = reader.parse_value(line, node, value)?;
                        match reader.steps.last_mut() {
                            Some(step) => step.changes.push((node, value)),
                            None => reader.vars[node].value = value,
                        }
                    }
                }
            }
        }
        debug!(
            "Parsed VCD trace with {} variables and {} time steps",
            reader.vars.len(),
            reader.steps.len()
        );
        Ok(reader)
    }

    fn parse_value(&self, line: usize, node: NodeRef, text: &str) -> Result<SignalValue> {
        let kind = self.vars[node].kind;
        let (prefix, rest) = text.split_at(text.chars().next().map_or(0, char::len_utf8));
        let value = match (kind, prefix) {
            (SignalKind::Analog, "r") | (SignalKind::Analog, "R") => {
                rest.parse().ok().map(SignalValue::Analog)
            }
            (SignalKind::Bool, "b") | (SignalKind::Bool, "B") => {
                rest.chars().last().and_then(BoolValue::from_char).map(SignalValue::Bool)
            }
            (SignalKind::Bool, _) => prefix
                .chars()
                .next()
                .and_then(BoolValue::from_char)
                .map(SignalValue::Bool),
            (SignalKind::Int(w), "b") | (SignalKind::Int(w), "B") => {
                parse_bit_string(w, rest).map(SignalValue::Int)
            }
            (SignalKind::Int(w), _) => parse_bit_string(w, prefix).map(SignalValue::Int),
            _ => None,
        };
        match value {
            Some(v) => Ok(v),
            None => parse_error(
                line,
                format!("invalid value `{}` for {} `{}`", text, kind, self.vars[node].name),
            ),
        }
    }

    fn step_seconds(&self, step: &Step) -> f64 {
        step.ticks.to_biguint().to_f64().unwrap_or(std::f64::INFINITY) * self.timescale.seconds()
    }

    fn apply_next(&mut self) {
        let step = &self.steps[self.position];
        for (node, value) in &step.changes {
            self.vars[*node].value = value.clone();
        }
        self.cursor = self.step_seconds(step);
        self.position += 1;
    }

    /// The timescale of the trace.
    pub fn timescale(&self) -> Timescale {
        self.timescale
    }

    /// The time mode the trace was opened with.
    pub fn mode(&self) -> TimeMode {
        self.mode
    }

    /// The time of the cursor, in seconds.
    pub fn cursor(&self) -> f64 {
        self.cursor
    }
}

impl TraceReader for VcdReader {
    fn header(&mut self) -> Result<TraceHeader> {
        let stop_time = match self.steps.last() {
            Some(step) => self.step_seconds(step),
            None => 0.0,
        };
        Ok(TraceHeader {
            stop_time,
            time_per_tick: self.timescale.seconds(),
        })
    }

    fn signal_lookup(&mut self, name: &str) -> Result<Option<NodeRef>> {
        Ok(self.names.get(name).cloned())
    }

    fn signal_type(&mut self, node: NodeRef) -> Result<SignalKind> {
        self.vars
            .get(node)
            .map(|v| v.kind)
            .ok_or(TraceError::UnknownSignal)
    }

    fn get_signal(&mut self, node: NodeRef) -> Result<SignalValue> {
        self.vars
            .get(node)
            .map(|v| v.value.clone())
            .ok_or(TraceError::UnknownSignal)
    }

    fn advance_time(&mut self, steps: u64) -> Result<()> {
        for _ in 0..steps {
            if self.position >= self.steps.len() {
                break;
            }
            self.apply_next();
        }
        Ok(())
    }

    fn advance_time_by(&mut self, delta: f64) -> Result<()> {
        let target = self.cursor + delta;
        let slack = self.timescale.seconds() * 0.5;
        while self.position < self.steps.len()
            && self.step_seconds(&self.steps[self.position]) <= target + slack
        {
            self.apply_next();
        }
        self.cursor = self.cursor.max(target);
        Ok(())
    }

    fn has_more_data(&mut self) -> Result<bool> {
        Ok(self.position < self.steps.len())
    }

    fn close(self: Box<Self>) -> Result<()> {
        trace!("Closed VCD reader at {}s", self.cursor);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    fn trace() -> &'static str {
        indoc! {"
        $date
           today
        $end
        $timescale 10 ns $end
        $scope module top $end
        $var wire 1 ! a $end
        $var wire 4 \" b $end
        $var real 1 # r $end
        $upscope $end
        $enddefinitions $end
        $dumpvars
        b0 !
        b0000 \"
        r0 #
        $end
        #0
        b1 !
        #3
        b1010 \"
        r2.5 #
        #7
        0!
    "}
    }

    fn node(r: &mut VcdReader, name: &str) -> NodeRef {
        r.signal_lookup(name).unwrap().unwrap()
    }

    #[test]
    fn declarations() {
        let mut r = VcdReader::parse(trace(), TimeMode::Real).unwrap();
        let (a, b, x) = (node(&mut r, "a"), node(&mut r, "b"), node(&mut r, "r"));
        assert_eq!(r.signal_type(a).unwrap(), SignalKind::Bool);
        assert_eq!(r.signal_type(b).unwrap(), SignalKind::Int(4));
        assert_eq!(r.signal_type(x).unwrap(), SignalKind::Analog);
        assert_eq!(r.signal_lookup("nope").unwrap(), None);
        let h = r.header().unwrap();
        assert_eq!(h.time_per_tick, 1e-8);
        assert!((h.stop_time - 7e-8).abs() < 1e-20);
    }

    #[test]
    fn stepping() {
        let mut r = VcdReader::parse(trace(), TimeMode::Real).unwrap();
        let (a, b, x) = (node(&mut r, "a"), node(&mut r, "b"), node(&mut r, "r"));
        assert_eq!(r.get_signal(a).unwrap(), SignalValue::Bool(BoolValue::False));
        r.advance_time(1).unwrap();
        assert_eq!(r.get_signal(a).unwrap(), SignalValue::Bool(BoolValue::True));
        assert_eq!(r.get_signal(b).unwrap(), SignalValue::Int(WideValue::zero(4)));
        r.advance_time(1).unwrap();
        assert_eq!(r.get_signal(b).unwrap(), SignalValue::Int(WideValue::from_u64(4, 10)));
        assert_eq!(r.get_signal(x).unwrap(), SignalValue::Analog(2.5));
        assert!(r.has_more_data().unwrap());
        r.advance_time(5).unwrap();
        assert_eq!(r.get_signal(a).unwrap(), SignalValue::Bool(BoolValue::False));
        assert!(!r.has_more_data().unwrap());
    }

    #[test]
    fn advancing_by_time() {
        let mut r = VcdReader::parse(trace(), TimeMode::Real).unwrap();
        let b = node(&mut r, "b");
        r.advance_time_by(2e-8).unwrap();
        assert_eq!(r.get_signal(b).unwrap(), SignalValue::Int(WideValue::zero(4)));
        r.advance_time_by(1e-8).unwrap();
        assert_eq!(r.get_signal(b).unwrap(), SignalValue::Int(WideValue::from_u64(4, 10)));
        assert!(r.has_more_data().unwrap());
    }

    #[test]
    fn malformed_input() {
        assert!(VcdReader::parse("$timescale 3 ns $end", TimeMode::Real).is_err());
        assert!(VcdReader::parse("$var wire 1 ! a", TimeMode::Real).is_err());
        match VcdReader::parse("$var wire 1 ! a $end\n#0\n1?\n", TimeMode::Real) {
            Err(TraceError::Parse { line, .. }) => assert_eq!(line, 3),
            r => panic!("unexpected {:?}", r.map(|_| ())),
        }
    }
}
