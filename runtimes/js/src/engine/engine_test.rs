use std::cell::Cell;
use std::rc::Rc;

use pretty_assertions::assert_eq;

use super::*;
use crate::test_utils::init_test_logging;

fn thrown_message(ctx: &JsContext, thrown: JsValue) -> String {
    ctx.get(&thrown, "message")
        .ok()
        .and_then(|message| message.as_str().map(str::to_string))
        .unwrap_or_default()
}

#[test]
fn test_properties_and_arrays() {
    let ctx = JsContext::new();
    let object = JsValue::Object(ctx.new_object());
    ctx.set(&object, "a", JsValue::Number(1.0)).unwrap();
    assert_eq!(ctx.get(&object, "a").unwrap(), JsValue::Number(1.0));
    assert_eq!(ctx.get(&object, "missing").unwrap(), JsValue::Undefined);

    let array = JsValue::Object(ctx.new_array(vec![JsValue::Bool(true)]));
    ctx.set_index(&array, 2, JsValue::string("x")).unwrap();
    assert_eq!(ctx.get(&array, "length").unwrap(), JsValue::Number(3.0));
    assert_eq!(ctx.get(&array, "1").unwrap(), JsValue::Undefined);
    assert_eq!(ctx.get_index(&array, 2).unwrap(), JsValue::string("x"));
    assert_eq!(ctx.keys(&array).unwrap(), vec!["0", "1", "2"]);
}

#[test]
fn test_property_access_on_primitives_throws() {
    let ctx = JsContext::new();
    let thrown = ctx.get(&JsValue::Undefined, "x").unwrap_err();
    assert_eq!(
        thrown_message(&ctx, thrown),
        "Cannot access property 'x' of undefined"
    );
}

#[test]
fn test_native_functions() {
    let ctx = JsContext::new();
    let add = ctx.new_function("add", |_, info| {
        let a = info.arg(0).as_number().unwrap_or(f64::NAN);
        let b = info.arg(1).as_number().unwrap_or(f64::NAN);
        Ok(JsValue::Number(a + b))
    });
    let add = JsValue::Object(add);
    assert_eq!(ctx.get(&add, "name").unwrap(), JsValue::string("add"));
    assert_eq!(
        ctx.call(&add, &JsValue::Undefined, &[JsValue::Number(2.0), JsValue::Number(3.0)])
            .unwrap(),
        JsValue::Number(5.0)
    );

    let thrown = ctx
        .call(&JsValue::Number(1.0), &JsValue::Undefined, &[])
        .unwrap_err();
    assert_eq!(thrown_message(&ctx, thrown), "1 is not a function");
}

#[test]
fn test_scopes_release_handles() {
    init_test_logging();
    let ctx = JsContext::with_options(JsContextOptions {
        gc_threshold: 0,
        ..JsContextOptions::default()
    });
    let before = ctx.live_objects();
    let kept = ctx.scope(|ctx| {
        let kept = JsValue::Object(ctx.new_object());
        ctx.new_array(vec![]);
        ctx.set_global("kept", kept.clone());
        kept
    });
    assert_eq!(ctx.live_objects(), before + 2);
    assert_eq!(ctx.collect_garbage(), 1);
    assert!(ctx.is_alive(kept.as_object().unwrap()));

    assert!(ctx.delete_global("kept"));
    assert_eq!(ctx.collect_garbage(), 1);
    assert!(!ctx.is_alive(kept.as_object().unwrap()));
    assert_eq!(ctx.gc_stats().collections, 2);
}

#[test]
fn test_weak_callback_runs_once_with_fields() {
    let ctx = JsContext::new();
    let template = ctx.register_template(ObjectTemplate::new("Holder").internal_fields(1));
    let released = Rc::new(Cell::new(0));
    let payload = Rc::new(String::from("payload"));

    ctx.scope(|ctx| {
        let holder = ctx.new_instance(template);
        assert!(ctx.set_internal_field(holder, 0, Box::new(payload.clone())));
        assert!(!ctx.set_internal_field(holder, 1, Box::new(())));
        assert_eq!(
            ctx.internal_field::<Rc<String>>(holder, 0).as_deref(),
            Some(&String::from("payload"))
        );
        let released = released.clone();
        ctx.set_weak(holder, move |info| {
            let field = info.take_internal_field::<Rc<String>>(0);
            assert!(field.is_some());
            released.set(released.get() + 1);
        });
    });
    assert_eq!(Rc::strong_count(&payload), 2);

    ctx.collect_garbage();
    ctx.collect_garbage();
    assert_eq!(released.get(), 1);
    assert_eq!(Rc::strong_count(&payload), 1);
}

fn counting_getter(_: &JsContext, _: Handle, key: &str) -> JsResult<Option<JsValue>> {
    Ok((key == "magic").then(|| JsValue::Number(42.0)))
}

fn refusing_setter(ctx: &JsContext, _: Handle, key: &str, _: JsValue) -> JsResult<bool> {
    if key == "magic" {
        return Err(ctx.type_error("magic is read only"));
    }
    Ok(false)
}

fn list_keys(_: &JsContext, _: Handle) -> JsResult<Vec<String>> {
    Ok(vec!["magic".to_string()])
}

fn echo_call(_: &JsContext, info: &CallInfo<'_>) -> JsResult<JsValue> {
    Ok(info.arg(0))
}

#[test]
fn test_template_interceptors() {
    let ctx = JsContext::new();
    let template = ctx.register_template(
        ObjectTemplate::new("Magic")
            .named(counting_getter, refusing_setter)
            .enumerator(list_keys)
            .callable(echo_call),
    );
    let magic = JsValue::Object(ctx.new_instance(template));
    assert_eq!(ctx.class_name(magic.as_object().unwrap()).as_deref(), Some("Magic"));
    assert_eq!(ctx.get(&magic, "magic").unwrap(), JsValue::Number(42.0));

    ctx.set(&magic, "other", JsValue::Bool(true)).unwrap();
    assert_eq!(ctx.get(&magic, "other").unwrap(), JsValue::Bool(true));

    let thrown = ctx.set(&magic, "magic", JsValue::Null).unwrap_err();
    assert_eq!(thrown_message(&ctx, thrown), "magic is read only");
    assert_eq!(ctx.keys(&magic).unwrap(), vec!["magic"]);

    assert!(ctx.is_callable(magic.as_object().unwrap()));
    assert_eq!(
        ctx.call(&magic, &JsValue::Undefined, &[JsValue::string("hi")])
            .unwrap(),
        JsValue::string("hi")
    );
}

#[test]
fn test_automatic_collection() {
    let ctx = JsContext::with_options(JsContextOptions {
        gc_threshold: 8,
        ..JsContextOptions::default()
    });
    for _ in 0..4 {
        ctx.scope(|ctx| {
            for _ in 0..8 {
                ctx.new_object();
            }
        });
    }
    assert!(ctx.gc_stats().collections >= 3);
    assert!(ctx.live_objects() <= 9);
}

#[test]
fn test_callbacks_may_reenter() {
    let ctx = JsContext::new();
    let inner = JsValue::Object(ctx.new_function("inner", |_, _| Ok(JsValue::Number(1.0))));
    ctx.set_global("inner", inner);
    let outer = ctx.new_function("outer", |ctx, _| {
        let inner = ctx.get_global("inner");
        let one = ctx.call(&inner, &JsValue::Undefined, &[])?;
        let array = ctx.new_array(vec![one]);
        ctx.collect_garbage();
        Ok(JsValue::Object(array))
    });
    let result = ctx
        .call(&JsValue::Object(outer), &JsValue::Undefined, &[])
        .unwrap();
    assert_eq!(ctx.get_index(&result, 0).unwrap(), JsValue::Number(1.0));
}

#[test]
fn test_embedder_data() {
    let ctx = JsContext::new();
    assert!(ctx.embedder_data::<String>().is_none());
    ctx.set_embedder_data(Rc::new(String::from("bridge")));
    assert_eq!(ctx.embedder_data::<String>().as_deref(), Some(&String::from("bridge")));
    assert!(ctx.embedder_data::<u32>().is_none());

    let weak = ctx.downgrade();
    assert!(weak.upgrade().is_some_and(|other| other.ptr_eq(&ctx)));
    drop(ctx);
    assert!(weak.upgrade().is_none());
}
