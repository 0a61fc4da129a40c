use std::sync::Arc;

use log::{debug, info};
use rhai::{Dynamic, Engine, FnPtr, NativeCallContext};

use crate::dsp::oscillator::Waveform;
use crate::graph::chorus::{CHORUS_BASE, CHORUS_DIFF, PHASER_STAGES};
use crate::graph::{BinaryOp, GraphBuilder, NodeId, Operand, Template};
use crate::script::handle::{
    build_error, emit, enter, node_operand, number, numbers, operand, operands, script_error,
    with_builder, NodeRef, ScriptResult,
};
use crate::sequencing::{RhythmPattern, ScaleMask};

/// Upper bound on interpreter steps for one build, so a runaway loop in a
/// patch fails the reload instead of hanging the console.
pub const MAX_OPERATIONS: u64 = 5_000_000;
const MAX_CALL_LEVELS: usize = 64;

/// A template as seen by a script.
#[derive(Debug, Clone)]
pub struct TemplateRef(pub Arc<Template>);

/// Read side of a feedback slot plus the slot number used by `close`.
#[derive(Debug, Clone, Copy)]
pub struct Feedback {
    slot: u32,
    value: NodeRef,
}

fn op1<F>(f: F) -> impl Fn(Dynamic) -> ScriptResult<NodeRef> + Send + Sync + 'static
where
    F: Fn(&mut GraphBuilder, Operand) -> NodeId + Send + Sync + 'static,
{
    move |a| {
        let a = operand(a)?;
        emit(|b| f(b, a))
    }
}

fn op2<F>(f: F) -> impl Fn(Dynamic, Dynamic) -> ScriptResult<NodeRef> + Send + Sync + 'static
where
    F: Fn(&mut GraphBuilder, Operand, Operand) -> NodeId + Send + Sync + 'static,
{
    move |a, b| {
        let (a, b) = (operand(a)?, operand(b)?);
        emit(|g| f(g, a, b))
    }
}

fn op3<F>(f: F) -> impl Fn(Dynamic, Dynamic, Dynamic) -> ScriptResult<NodeRef> + Send + Sync + 'static
where
    F: Fn(&mut GraphBuilder, Operand, Operand, Operand) -> NodeId + Send + Sync + 'static,
{
    move |a, b, c| {
        let (a, b, c) = (operand(a)?, operand(b)?, operand(c)?);
        emit(|g| f(g, a, b, c))
    }
}

fn op4<F>(
    f: F,
) -> impl Fn(Dynamic, Dynamic, Dynamic, Dynamic) -> ScriptResult<NodeRef> + Send + Sync + 'static
where
    F: Fn(&mut GraphBuilder, Operand, Operand, Operand, Operand) -> NodeId + Send + Sync + 'static,
{
    move |a, b, c, d| {
        let (a, b, c, d) = (operand(a)?, operand(b)?, operand(c)?, operand(d)?);
        emit(|g| f(g, a, b, c, d))
    }
}

fn arith(op: BinaryOp, lhs: Operand, rhs: Operand) -> ScriptResult<NodeRef> {
    emit(|b| b.binary(op, lhs, rhs))
}

fn register_operator(engine: &mut Engine, name: &str, op: BinaryOp) {
    engine.register_fn(name, move |a: NodeRef, b: NodeRef| {
        arith(op, node_operand(a)?, node_operand(b)?)
    });
    engine.register_fn(name, move |a: NodeRef, b: f64| {
        arith(op, node_operand(a)?, Operand::Const(b))
    });
    engine.register_fn(name, move |a: f64, b: NodeRef| {
        arith(op, Operand::Const(a), node_operand(b)?)
    });
    engine.register_fn(name, move |a: NodeRef, b: i64| {
        arith(op, node_operand(a)?, Operand::Const(b as f64))
    });
    engine.register_fn(name, move |a: i64, b: NodeRef| {
        arith(op, Operand::Const(a as f64), node_operand(b)?)
    });
}

fn waveform(name: &str) -> ScriptResult<Waveform> {
    Waveform::from_name(name).ok_or_else(|| {
        let known: Vec<_> = Waveform::ALL.iter().map(|w| w.name()).collect();
        script_error(format!(
            "unknown waveform `{}` (expected one of {})",
            name,
            known.join(", ")
        ))
    })
}

fn names(values: rhai::Array) -> ScriptResult<Vec<String>> {
    values
        .into_iter()
        .map(|value| {
            let type_name = value.type_name();
            value
                .into_string()
                .map_err(|_| script_error(format!("expected a parameter name, got {}", type_name)))
        })
        .collect()
}

/// Evaluate `body` in a nested builder and freeze it as a template.
fn template(ctx: NativeCallContext, params: rhai::Array, body: FnPtr) -> ScriptResult<TemplateRef> {
    let params = names(params)?;
    let nested = with_builder(|b| b.child())?;
    let guard = enter(nested);

    let output = body.call_within_context::<Dynamic>(&ctx, ())?;
    if output.is_unit() {
        return Err(script_error("template body must end with an expression"));
    }
    let output = operand(output)?;
    let root = with_builder(|b| b.input(output))?;

    let nested = guard
        .leave()
        .ok_or_else(|| script_error("template scope was lost"))?;
    let graph = nested.finish(root).map_err(build_error)?;
    debug!("template with {} nodes, params {:?}", graph.len(), params);
    Ok(TemplateRef(Arc::new(Template::new(graph, params))))
}

fn invoke(template: &mut TemplateRef, args: rhai::Map) -> ScriptResult<NodeRef> {
    let mut bound = Vec::with_capacity(args.len());
    for (name, value) in args {
        bound.push((name.to_string(), operand(value)?));
    }
    emit(|b| b.call(&template.0, bound))
}

fn register_core(engine: &mut Engine) {
    engine
        .register_type_with_name::<NodeRef>("Node")
        .register_type_with_name::<TemplateRef>("Template")
        .register_type_with_name::<ScaleMask>("Scale")
        .register_type_with_name::<Feedback>("Feedback")
        .register_get("value", |fb: &mut Feedback| fb.value);

    register_operator(engine, "+", BinaryOp::Add);
    register_operator(engine, "-", BinaryOp::Sub);
    register_operator(engine, "*", BinaryOp::Mul);
    register_operator(engine, "/", BinaryOp::Div);
    register_operator(engine, "%", BinaryOp::Rem);
    engine.register_fn("-", |a: NodeRef| {
        let a = node_operand(a)?;
        emit(|b| b.neg(a))
    });

    engine.register_fn("constant", |x: Dynamic| {
        let x = number(&x)?;
        emit(|b| b.constant(x))
    });
    engine.register_fn("load", |name: &str| emit(|b| b.reference(name)));
    engine.register_fn("store", |name: &str, value: Dynamic| {
        let value = operand(value)?;
        emit(|b| b.store(name, value))
    });
    engine.register_fn("int", op1(|b, x| b.int(x)));
    engine.register_fn("boolean", op1(|b, x| b.boolean(x)));
    engine.register_fn("interpolate", op3(|b, dry, wet, ratio| b.interpolate(dry, wet, ratio)));
    engine.register_fn("mix", |inputs: rhai::Array| {
        let inputs = operands(inputs)?;
        emit(|b| b.mix(inputs))
    });

    engine.register_fn("feedback", || -> ScriptResult<Feedback> {
        let mut slot = 0;
        let value = emit(|b| {
            let (read, resolver) = b.feedback_slot();
            slot = resolver.slot();
            read
        })?;
        Ok(Feedback { slot, value })
    });
    engine.register_fn("close", |fb: Feedback, value: Dynamic| {
        node_operand(fb.value)?;
        let value = operand(value)?;
        emit(|b| b.close_feedback(fb.slot, value))
    });
}

fn register_sources(engine: &mut Engine) {
    engine.register_fn("sine", op1(|b, f| b.sine(f)));
    engine.register_fn("cosine", op1(|b, f| b.cosine(f)));
    engine.register_fn("square", op1(|b, f| b.square(f)));
    engine.register_fn("saw_up", op1(|b, f| b.saw_up(f)));
    engine.register_fn("saw_down", op1(|b, f| b.saw_down(f)));
    engine.register_fn("triangle", op1(|b, f| b.triangle(f)));
    engine.register_fn("pulse", op2(|b, f, w| b.pulse(f, w)));
    engine.register_fn("oscillator", |name: &str, frequency: Dynamic| {
        let waveform = waveform(name)?;
        let frequency = operand(frequency)?;
        emit(|b| b.oscillator(waveform, frequency))
    });
    engine.register_fn("synced", |name: &str, frequency: Dynamic, source: NodeRef| {
        let waveform = waveform(name)?;
        let frequency = operand(frequency)?;
        node_operand(source)?;
        emit(|b| b.synced(waveform, frequency, source.id()))
    });
    engine.register_fn("noise", || emit(|b| b.noise()));
}

fn register_processors(engine: &mut Engine) {
    engine.register_fn("lowpass", op3(|b, x, f, q| b.lowpass(x, f, q)));
    engine.register_fn("highpass", op3(|b, x, f, q| b.highpass(x, f, q)));
    engine.register_fn("bandpass", op3(|b, x, f, q| b.bandpass(x, f, q)));
    engine.register_fn("notch", op3(|b, x, f, q| b.notch(x, f, q)));
    engine.register_fn("allpass", op2(|b, x, f| b.allpass(x, f)));

    engine.register_fn("soft_saturate", op2(|b, x, c| b.soft_saturate(x, c)));
    engine.register_fn("hard_saturate", op2(|b, x, c| b.hard_saturate(x, c)));
    engine.register_fn("wavefold", op4(|b, x, n, g, base| b.wavefold(x, n, g, base)));

    engine.register_fn("history", op2(|b, x, lag| b.history(x, lag)));
    engine.register_fn("delay", op4(|b, x, t, mix, fb| b.delay(x, t, mix, fb)));
    engine.register_fn(
        "chorus",
        op2(|b, x, rate| b.chorus(x, rate, CHORUS_BASE, CHORUS_DIFF)),
    );
    engine.register_fn("chorus", op4(|b, x, rate, base, diff| b.chorus(x, rate, base, diff)));
    engine.register_fn(
        "phaser",
        op3(|b, x, f, mix| b.phaser(x, f, mix, PHASER_STAGES)),
    );
    engine.register_fn(
        "phaser",
        |x: Dynamic, f: Dynamic, mix: Dynamic, stages: i64| {
            let (x, f, mix) = (operand(x)?, operand(f)?, operand(mix)?);
            let stages = usize::try_from(stages)
                .map_err(|_| script_error(format!("phaser stage count {} is negative", stages)))?;
            emit(|b| b.phaser(x, f, mix, stages))
        },
    );

    engine.register_fn("envelope", op3(|b, x, t, gate| b.envelope(x, t, gate)));
    engine.register_fn("exp_envelope", op2(|b, x, gate| b.exp_envelope(x, gate)));
    engine.register_fn("envelope_beat", op3(|b, x, t, beat| b.envelope_beat(x, t, beat)));
    engine.register_fn("exp_envelope_beat", op2(|b, x, beat| b.exp_envelope_beat(x, beat)));

    engine.register_fn("pan", op2(|b, x, pos| b.pan(x, pos)));
    engine.register_fn("pan2d", op3(|b, x, px, py| b.pan2d(x, px, py)));
}

fn register_control(engine: &mut Engine) {
    engine.register_fn("beat", op1(|b, bpm| b.beat(bpm)));
    engine.register_fn("trigger", op1(|b, beat| b.trigger(beat)));
    engine.register_fn("switcher", |index: Dynamic, branches: rhai::Array| {
        let index = operand(index)?;
        let branches = operands(branches)?;
        emit(|b| b.switcher(index, branches))
    });
    engine.register_fn("rhythm", |weights: rhai::Array, beat: Dynamic| {
        let pattern = RhythmPattern::new(&numbers(&weights)?).map_err(build_error)?;
        let beat = operand(beat)?;
        emit(|b| b.rhythm(pattern, beat))
    });
    engine.register_fn("sample_hold", op2(|b, trigger, x| b.sample_hold(trigger, x)));
    engine.register_fn("glissando", op3(|b, target, step, trigger| b.glissando(target, step, trigger)));
    engine.register_fn(
        "random_walk",
        |min: Dynamic, max: Dynamic, spread: Dynamic, trigger: Dynamic| {
            let (min, max, spread) = (number(&min)?, number(&max)?, number(&spread)?);
            let trigger = operand(trigger)?;
            emit(|b| b.random_walk(min, max, spread, trigger))
        },
    );
}

fn register_pitch(engine: &mut Engine) {
    engine.register_fn("diatonic", op1(|b, note| b.diatonic(note)));
    engine.register_fn("diatonic", |note: Dynamic, base: Dynamic, reference: Dynamic| {
        let note = operand(note)?;
        let (base, reference) = (number(&base)?, number(&reference)?);
        emit(|b| b.diatonic_with(note, base, reference))
    });
    engine.register_fn("major_scale", |root: i64| ScaleMask::major(root).map_err(build_error));
    engine.register_fn("scale_mask", |name: &str, root: i64| {
        ScaleMask::named(name, root).map_err(build_error)
    });
    engine.register_fn("scale", |note: Dynamic, mask: ScaleMask| {
        let note = operand(note)?;
        emit(|b| b.scale(note, mask))
    });
}

fn register_templates(engine: &mut Engine) {
    engine.register_fn("template", template);
    engine.register_fn("invoke", invoke);
    engine.register_fn("chord", |template: TemplateRef, offsets: rhai::Array, base: Dynamic| {
        let offsets = numbers(&offsets)?;
        let base = operand(base)?;
        emit(|b| b.chord(&template.0, &offsets, base))
    });
    engine.register_fn("midi_voices", |template: TemplateRef| {
        emit(|b| b.midi_voices(&template.0))
    });
}

/// Register the patch language on `engine`.
pub fn register(engine: &mut Engine) {
    engine
        .set_max_operations(MAX_OPERATIONS)
        .set_max_call_levels(MAX_CALL_LEVELS);
    engine.on_print(|text| info!("script: {}", text));
    engine.on_debug(|text, source, pos| debug!("script {:?} {}: {}", source, pos, text));

    register_core(engine);
    register_sources(engine);
    register_processors(engine);
    register_control(engine);
    register_pitch(engine);
    register_templates(engine);
}
