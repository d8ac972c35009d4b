//! Declarative expressions in the rendering engine's JSON array syntax.
//!
//! Expressions are built here and handed to the engine for per-feature
//! evaluation. The local evaluator covers exactly the operators this
//! workspace emits, so filters can be checked against synthetic features
//! without an engine.

use std::fmt;

use serde_json::{Map, Value};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Op {
    Get,
    Id,
    Zoom,
    Coalesce,
    ToNumber,
    Max,
    Div,
    Rem,
    Eq,
    Ge,
    Lt,
    All,
    Any,
    Step,
    Match,
    Interpolate,
    Linear,
}

impl Op {
    pub const ALL: [Op; 17] = [
        Op::Get,
        Op::Id,
        Op::Zoom,
        Op::Coalesce,
        Op::ToNumber,
        Op::Max,
        Op::Div,
        Op::Rem,
        Op::Eq,
        Op::Ge,
        Op::Lt,
        Op::All,
        Op::Any,
        Op::Step,
        Op::Match,
        Op::Interpolate,
        Op::Linear,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Op::Get => "get",
            Op::Id => "id",
            Op::Zoom => "zoom",
            Op::Coalesce => "coalesce",
            Op::ToNumber => "to-number",
            Op::Max => "max",
            Op::Div => "/",
            Op::Rem => "%",
            Op::Eq => "==",
            Op::Ge => ">=",
            Op::Lt => "<",
            Op::All => "all",
            Op::Any => "any",
            Op::Step => "step",
            Op::Match => "match",
            Op::Interpolate => "interpolate",
            Op::Linear => "linear",
        }
    }

    pub fn from_name(name: &str) -> Option<Op> {
        Op::ALL.into_iter().find(|op| op.name() == name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Value),
    Call(Op, Vec<Expr>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExprError {
    UnknownOperator(String),
    Malformed(String),
}

impl fmt::Display for ExprError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExprError::UnknownOperator(op) => write!(f, "unknown expression operator: {op}"),
            ExprError::Malformed(msg) => write!(f, "malformed expression: {msg}"),
        }
    }
}

impl std::error::Error for ExprError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EvalError {
    Arity(&'static str),
    Type(String),
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvalError::Arity(op) => write!(f, "wrong number of arguments for {op}"),
            EvalError::Type(msg) => write!(f, "type error: {msg}"),
        }
    }
}

impl std::error::Error for EvalError {}

/// What the evaluator can see of one feature.
#[derive(Debug, Copy, Clone)]
pub struct FeatureContext<'a> {
    pub properties: &'a Map<String, Value>,
    pub id: Option<&'a Value>,
    pub zoom: f64,
}

impl<'a> FeatureContext<'a> {
    pub fn new(properties: &'a Map<String, Value>) -> Self {
        Self {
            properties,
            id: None,
            zoom: 0.0,
        }
    }

    pub fn with_id(mut self, id: &'a Value) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_zoom(mut self, zoom: f64) -> Self {
        self.zoom = zoom;
        self
    }
}

impl Expr {
    pub fn lit(v: impl Into<Value>) -> Expr {
        Expr::Literal(v.into())
    }

    pub fn call(op: Op, args: Vec<Expr>) -> Expr {
        Expr::Call(op, args)
    }

    pub fn get(key: &str) -> Expr {
        Expr::call(Op::Get, vec![Expr::lit(key)])
    }

    pub fn id() -> Expr {
        Expr::call(Op::Id, Vec::new())
    }

    pub fn zoom() -> Expr {
        Expr::call(Op::Zoom, Vec::new())
    }

    pub fn coalesce(args: Vec<Expr>) -> Expr {
        Expr::call(Op::Coalesce, args)
    }

    pub fn to_number(e: Expr) -> Expr {
        Expr::call(Op::ToNumber, vec![e])
    }

    pub fn max(a: Expr, b: Expr) -> Expr {
        Expr::call(Op::Max, vec![a, b])
    }

    pub fn div(a: Expr, b: Expr) -> Expr {
        Expr::call(Op::Div, vec![a, b])
    }

    pub fn rem(a: Expr, b: Expr) -> Expr {
        Expr::call(Op::Rem, vec![a, b])
    }

    pub fn eq(a: Expr, b: Expr) -> Expr {
        Expr::call(Op::Eq, vec![a, b])
    }

    pub fn ge(a: Expr, b: Expr) -> Expr {
        Expr::call(Op::Ge, vec![a, b])
    }

    pub fn lt(a: Expr, b: Expr) -> Expr {
        Expr::call(Op::Lt, vec![a, b])
    }

    pub fn all(args: Vec<Expr>) -> Expr {
        Expr::call(Op::All, args)
    }

    pub fn any(args: Vec<Expr>) -> Expr {
        Expr::call(Op::Any, args)
    }

    /// `["==", 1, 0]`: a predicate no feature satisfies.
    pub fn never() -> Expr {
        Expr::eq(Expr::lit(1), Expr::lit(0))
    }

    /// `["step", input, default, stop_1, out_1, …]`.
    pub fn step(input: Expr, default: Expr, stops: Vec<(f64, Expr)>) -> Expr {
        let mut args = vec![input, default];
        for (stop, out) in stops {
            args.push(Expr::lit(stop));
            args.push(out);
        }
        Expr::call(Op::Step, args)
    }

    /// `["match", input, label_1, out_1, …, fallback]`.
    pub fn match_cases(input: Expr, cases: Vec<(Value, Expr)>, fallback: Expr) -> Expr {
        let mut args = vec![input];
        for (label, out) in cases {
            args.push(Expr::Literal(label));
            args.push(out);
        }
        args.push(fallback);
        Expr::call(Op::Match, args)
    }

    /// `["interpolate", ["linear"], ["zoom"], z_1, v_1, …]`.
    pub fn interpolate_zoom(stops: &[(f64, f64)]) -> Expr {
        let mut args = vec![Expr::call(Op::Linear, Vec::new()), Expr::zoom()];
        for (z, v) in stops {
            args.push(Expr::lit(*z));
            args.push(Expr::lit(*v));
        }
        Expr::call(Op::Interpolate, args)
    }

    pub fn to_json(&self) -> Value {
        match self {
            Expr::Literal(v) => v.clone(),
            Expr::Call(op, args) => {
                let mut out = Vec::with_capacity(args.len() + 1);
                out.push(Value::from(op.name()));
                out.extend(args.iter().map(Expr::to_json));
                Value::Array(out)
            }
        }
    }

    pub fn from_json(v: &Value) -> Result<Expr, ExprError> {
        match v {
            Value::Array(items) => {
                let Some(head) = items.first() else {
                    return Err(ExprError::Malformed("empty array".to_string()));
                };
                let Some(name) = head.as_str() else {
                    return Err(ExprError::Malformed(format!(
                        "operator must be a string, got {head}"
                    )));
                };
                let op = Op::from_name(name)
                    .ok_or_else(|| ExprError::UnknownOperator(name.to_string()))?;
                let args = items[1..]
                    .iter()
                    .map(Expr::from_json)
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Expr::Call(op, args))
            }
            Value::Object(_) => Err(ExprError::Malformed(
                "object literals are not supported".to_string(),
            )),
            other => Ok(Expr::Literal(other.clone())),
        }
    }

    /// Evaluates a filter predicate. Errors and non-boolean results count as
    /// "no match", which is how the engine treats them.
    pub fn matches(&self, ctx: &FeatureContext<'_>) -> bool {
        matches!(self.evaluate(ctx), Ok(Value::Bool(true)))
    }

    pub fn evaluate(&self, ctx: &FeatureContext<'_>) -> Result<Value, EvalError> {
        let (op, args) = match self {
            Expr::Literal(v) => return Ok(v.clone()),
            Expr::Call(op, args) => (*op, args.as_slice()),
        };
        match op {
            Op::Get => {
                let [key] = args else {
                    return Err(EvalError::Arity("get"));
                };
                let key = key.evaluate(ctx)?;
                let key = key
                    .as_str()
                    .ok_or_else(|| EvalError::Type(format!("get expects a string key, got {key}")))?;
                Ok(ctx.properties.get(key).cloned().unwrap_or(Value::Null))
            }
            Op::Id => Ok(ctx.id.cloned().unwrap_or(Value::Null)),
            Op::Zoom => Ok(Value::from(ctx.zoom)),
            Op::Coalesce => {
                for a in args {
                    let v = a.evaluate(ctx)?;
                    if !v.is_null() {
                        return Ok(v);
                    }
                }
                Ok(Value::Null)
            }
            Op::ToNumber => {
                if args.is_empty() {
                    return Err(EvalError::Arity("to-number"));
                }
                let mut last = Value::Null;
                for a in args {
                    let v = a.evaluate(ctx)?;
                    if let Some(n) = coerce_number(&v) {
                        return Ok(Value::from(n));
                    }
                    last = v;
                }
                Err(EvalError::Type(format!("could not convert {last} to number")))
            }
            Op::Max => {
                if args.is_empty() {
                    return Err(EvalError::Arity("max"));
                }
                let mut out = f64::NEG_INFINITY;
                for a in args {
                    out = out.max(number_arg(a, ctx, "max")?);
                }
                Ok(Value::from(out))
            }
            Op::Div | Op::Rem => {
                let [a, b] = args else {
                    return Err(EvalError::Arity(op.name()));
                };
                let a = number_arg(a, ctx, op.name())?;
                let b = number_arg(b, ctx, op.name())?;
                let v = if op == Op::Div { a / b } else { a % b };
                Ok(Value::from(v))
            }
            Op::Eq => {
                let [a, b] = args else {
                    return Err(EvalError::Arity("=="));
                };
                let a = a.evaluate(ctx)?;
                let b = b.evaluate(ctx)?;
                Ok(Value::Bool(values_equal(&a, &b)))
            }
            Op::Ge | Op::Lt => {
                let [a, b] = args else {
                    return Err(EvalError::Arity(op.name()));
                };
                let a = a.evaluate(ctx)?;
                let b = b.evaluate(ctx)?;
                let ord = compare(&a, &b).ok_or_else(|| {
                    EvalError::Type(format!("cannot compare {a} with {b}"))
                })?;
                let hit = if op == Op::Ge {
                    ord != std::cmp::Ordering::Less
                } else {
                    ord == std::cmp::Ordering::Less
                };
                Ok(Value::Bool(hit))
            }
            Op::All | Op::Any => {
                let short_circuit_on = op == Op::Any;
                for a in args {
                    let v = a.evaluate(ctx)?;
                    let b = v
                        .as_bool()
                        .ok_or_else(|| EvalError::Type(format!("{} expects booleans, got {v}", op.name())))?;
                    if b == short_circuit_on {
                        return Ok(Value::Bool(short_circuit_on));
                    }
                }
                Ok(Value::Bool(!short_circuit_on))
            }
            Op::Step => {
                if args.len() < 2 || args.len() % 2 != 0 {
                    return Err(EvalError::Arity("step"));
                }
                let input = number_arg(&args[0], ctx, "step")?;
                let mut chosen = &args[1];
                for pair in args[2..].chunks(2) {
                    let stop = number_arg(&pair[0], ctx, "step")?;
                    if input >= stop {
                        chosen = &pair[1];
                    } else {
                        break;
                    }
                }
                chosen.evaluate(ctx)
            }
            Op::Match => {
                if args.len() < 2 || args.len() % 2 != 0 {
                    return Err(EvalError::Arity("match"));
                }
                let input = args[0].evaluate(ctx)?;
                let fallback = &args[args.len() - 1];
                for pair in args[1..args.len() - 1].chunks(2) {
                    let label = pair[0].evaluate(ctx)?;
                    let hit = match &label {
                        Value::Array(labels) => labels.iter().any(|l| values_equal(l, &input)),
                        l => values_equal(l, &input),
                    };
                    if hit {
                        return pair[1].evaluate(ctx);
                    }
                }
                fallback.evaluate(ctx)
            }
            Op::Interpolate => {
                if args.len() < 4 || args.len() % 2 != 0 {
                    return Err(EvalError::Arity("interpolate"));
                }
                if args[0] != Expr::call(Op::Linear, Vec::new()) {
                    return Err(EvalError::Type("only linear interpolation is supported".to_string()));
                }
                let input = number_arg(&args[1], ctx, "interpolate")?;
                let mut stops: Vec<(f64, f64)> = Vec::with_capacity((args.len() - 2) / 2);
                for pair in args[2..].chunks(2) {
                    stops.push((
                        number_arg(&pair[0], ctx, "interpolate")?,
                        number_arg(&pair[1], ctx, "interpolate")?,
                    ));
                }
                Ok(Value::from(interpolate_linear(&stops, input)))
            }
            Op::Linear => Err(EvalError::Type("linear is only valid inside interpolate".to_string())),
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_json())
    }
}

fn number_arg(e: &Expr, ctx: &FeatureContext<'_>, op: &'static str) -> Result<f64, EvalError> {
    let v = e.evaluate(ctx)?;
    v.as_f64()
        .ok_or_else(|| EvalError::Type(format!("{op} expects a number, got {v}")))
}

/// `to-number` conversion: null and false are 0, true is 1, strings parse
/// after trimming (blank is 0).
fn coerce_number(v: &Value) -> Option<f64> {
    match v {
        Value::Null => Some(0.0),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let t = s.trim();
            if t.is_empty() {
                Some(0.0)
            } else {
                t.parse::<f64>().ok().filter(|n| !n.is_nan())
            }
        }
        _ => None,
    }
}

fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        (Value::String(x), Value::String(y)) => x == y,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Null, Value::Null) => true,
        _ => false,
    }
}

fn compare(a: &Value, b: &Value) -> Option<std::cmp::Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

fn interpolate_linear(stops: &[(f64, f64)], input: f64) -> f64 {
    let Some(first) = stops.first() else {
        return 0.0;
    };
    if input <= first.0 {
        return first.1;
    }
    for w in stops.windows(2) {
        let (z0, v0) = w[0];
        let (z1, v1) = w[1];
        if input <= z1 {
            let span = z1 - z0;
            if span <= 0.0 {
                return v1;
            }
            return v0 + (v1 - v0) * (input - z0) / span;
        }
    }
    stops[stops.len() - 1].1
}
