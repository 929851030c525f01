use std::sync::Arc;

use crate::dsl::ast::{Arg, CompiledNode};
use crate::model::{KeywordType, Value};
use crate::registry::{Args, BindTarget, EventSpec, HandlerError, Payload};

use super::host::{Binding, Host, HostError, SubscriptionId};

/// What executing a root node did.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// A FUNCTION chain ran; carries the root handler's return value.
    Ran(Option<Value>),
    /// An EVENT was bound; its body runs when the host fires it.
    Bound(SubscriptionId),
}

#[derive(Debug, thiserror::Error)]
pub enum ExecError {
    /// The native action failed. Passed through untouched.
    #[error("\"{keyword}\" failed: {source}")]
    Handler {
        keyword: String,
        source: HandlerError,
    },

    #[error("\"{keyword}\" needs a {expected} value but \"{producer}\" produced none")]
    MissingValue {
        keyword: String,
        expected: KeywordType,
        producer: String,
    },

    #[error("\"{keyword}\" is a {ty} keyword and cannot be run")]
    NotRunnable { keyword: String, ty: KeywordType },

    #[error("\"{keyword}\" is a {ty} keyword and cannot be bound")]
    NotBindable { keyword: String, ty: KeywordType },

    #[error("event \"{keyword}\" has no element to bind to")]
    MissingBindTarget { keyword: String },

    #[error("host rejected binding for \"{keyword}\": {source}")]
    Host { keyword: String, source: HostError },
}

/// Run or bind depending on the root's type.
pub fn execute(node: &CompiledNode, host: &mut dyn Host) -> Result<Outcome, ExecError> {
    match node.definition().payload() {
        Payload::Event(_) => bind(node, host).map(Outcome::Bound),
        _ => run(node, host).map(Outcome::Ran),
    }
}

/// Run a FUNCTION chain now: the child first, then this handler with its
/// positional arguments. A deferred slot takes the child's returned value.
pub fn run(node: &CompiledNode, host: &mut dyn Host) -> Result<Option<Value>, ExecError> {
    let Some(function) = node.definition().function() else {
        return Err(ExecError::NotRunnable {
            keyword: node.keyword().to_string(),
            ty: node.ty(),
        });
    };

    let produced = match node.child() {
        Some(child) => match execute(child, host)? {
            Outcome::Ran(value) => value,
            Outcome::Bound(_) => None,
        },
        None => None,
    };

    let args = collect_args(node, produced)?;
    tracing::info!(keyword = %node.keyword(), args = args.len(), "run");
    function
        .handler
        .invoke(&args)
        .map_err(|source| ExecError::Handler {
            keyword: node.keyword().to_string(),
            source,
        })
}

/// Subscribe an EVENT with the host. The child chain is deferred until the
/// host fires the event's signal on the bind target.
pub fn bind(node: &CompiledNode, host: &mut dyn Host) -> Result<SubscriptionId, ExecError> {
    let keyword = node.keyword().to_string();
    let Some(event) = node.definition().event() else {
        return Err(ExecError::NotBindable {
            keyword,
            ty: node.ty(),
        });
    };

    let target = match event {
        EventSpec::Target(target) => target.clone(),
        EventSpec::BoundElement => match node.value(0) {
            Some(Value::Word { word, .. }) => BindTarget::element(word.clone()),
            _ => return Err(ExecError::MissingBindTarget { keyword }),
        },
    };

    let binding = Binding {
        signal: keyword.clone(),
        target,
        body: node.child().cloned().map(Arc::new),
    };
    tracing::info!(event = %keyword, target = %binding.target, "bind");
    host.subscribe(binding)
        .map_err(|source| ExecError::Host { keyword, source })
}

fn collect_args(node: &CompiledNode, mut produced: Option<Value>) -> Result<Args, ExecError> {
    let mut values = Vec::with_capacity(node.slots().len());
    for slot in node.slots() {
        let value = match &slot.arg {
            Arg::Empty => None,
            Arg::Value(value) => Some(value.clone()),
            Arg::Deferred => {
                let value = produced.take().filter(|v| v.ty() == slot.ty);
                if value.is_none() && slot.required {
                    return Err(ExecError::MissingValue {
                        keyword: node.keyword().to_string(),
                        expected: slot.ty,
                        producer: node.child().map(|c| c.keyword().to_string()).unwrap_or_default(),
                    });
                }
                value
            }
        };
        values.push(value);
    }
    Ok(Args::new(values))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use parking_lot::Mutex;

    use super::*;
    use crate::dsl::compiler::compile;
    use crate::engine::EventLoop;
    use crate::model::KeywordType::{Color, Element, Event, Function, Shape};
    use crate::registry::{KeywordDraft, Registry};

    struct Fixture {
        registry: Registry,
        created: Arc<AtomicUsize>,
        log: Arc<Mutex<Vec<String>>>,
    }

    fn fixture() -> Fixture {
        let created = Arc::new(AtomicUsize::new(0));
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut registry = Registry::new();

        let (c, l) = (Arc::clone(&created), Arc::clone(&log));
        registry
            .register(
                KeywordDraft::function(["create"])
                    .required([Shape])
                    .optional([Color])
                    .produces(Shape)
                    .exec(move |args| {
                        c.fetch_add(1, Ordering::SeqCst);
                        let shape = args.str(0).unwrap_or_default().to_string();
                        l.lock().push(format!("create {shape} absent={}", args.is_absent(1)));
                        Ok(Some(Value::word(Shape, format!("{shape}#1"))))
                    }),
            )
            .unwrap();
        let l = Arc::clone(&log);
        registry
            .register(
                KeywordDraft::function(["fill"])
                    .required([Shape, Color])
                    .exec(move |args| {
                        l.lock().push(format!("fill {} {}", args.get(0).unwrap(), args.get(1).unwrap()));
                        Ok(None)
                    }),
            )
            .unwrap();
        registry
            .register(
                KeywordDraft::function(["clear"])
                    .produces(Shape)
                    .exec(|_| Ok(None)),
            )
            .unwrap();
        registry
            .register(KeywordDraft::function(["explode"]).exec(|_| Err("boom".into())))
            .unwrap();
        registry
            .register(KeywordDraft::event(["load"]).bind_to(BindTarget::host("document")))
            .unwrap();
        registry
            .register(KeywordDraft::event(["click"]).requires_bound_element())
            .unwrap();
        registry
            .register(KeywordDraft::new(Shape, ["circle"]))
            .unwrap();
        registry.register(KeywordDraft::new(Color, ["red"])).unwrap();
        registry
            .register(KeywordDraft::new(Element, ["banner"]))
            .unwrap();

        Fixture {
            registry,
            created,
            log,
        }
    }

    fn tree(f: &Fixture, words: &str) -> CompiledNode {
        let tokens: Vec<&str> = words.split_whitespace().collect();
        compile(&f.registry, &tokens).unwrap().expect("non-empty command")
    }

    #[test]
    fn function_runs_immediately_with_absent_optional() {
        let f = fixture();
        let mut host = EventLoop::new();
        let outcome = execute(&tree(&f, "create circle"), &mut host).unwrap();
        assert_eq!(outcome, Outcome::Ran(Some(Value::word(Shape, "circle#1"))));
        assert_eq!(f.log.lock().as_slice(), ["create circle absent=true"]);
        assert!(host.is_empty());
    }

    #[test]
    fn event_defers_body_until_fired() {
        let f = fixture();
        let mut host = EventLoop::new();
        let outcome = execute(&tree(&f, "load create circle"), &mut host).unwrap();
        assert!(matches!(outcome, Outcome::Bound(_)));
        assert_eq!(f.created.load(Ordering::SeqCst), 0);

        let document = BindTarget::host("document");
        assert_eq!(host.fire(&document, "load").unwrap(), 1);
        assert_eq!(f.created.load(Ordering::SeqCst), 1);
        assert_eq!(host.fire(&document, "load").unwrap(), 1);
        assert_eq!(f.created.load(Ordering::SeqCst), 2);
        assert_eq!(host.fire(&document, "click").unwrap(), 0);
    }

    #[test]
    fn bound_element_comes_from_the_command() {
        let f = fixture();
        let mut host = EventLoop::new();
        bind(&tree(&f, "click banner create circle"), &mut host).unwrap();
        let (_, binding) = host.bindings().next().unwrap();
        assert_eq!(binding.target, BindTarget::element("banner"));
        assert_eq!(binding.signal, "click");
        assert_eq!(host.fire(&BindTarget::element("banner"), "click").unwrap(), 1);
        assert_eq!(f.created.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn produced_value_fills_parent_slot() {
        let f = fixture();
        let mut host = EventLoop::new();
        run(&tree(&f, "fill red create circle"), &mut host).unwrap();
        assert_eq!(
            f.log.lock().as_slice(),
            ["create circle absent=true", "fill circle#1 red"]
        );
    }

    #[test]
    fn producer_returning_nothing_is_missing_value() {
        let f = fixture();
        let mut host = EventLoop::new();
        let err = run(&tree(&f, "fill red clear"), &mut host).unwrap_err();
        assert!(matches!(
            err,
            ExecError::MissingValue { ref keyword, expected: Shape, ref producer }
                if keyword == "fill" && producer == "clear"
        ));
    }

    #[test]
    fn handler_errors_pass_through() {
        let f = fixture();
        let mut host = EventLoop::new();
        let err = run(&tree(&f, "explode"), &mut host).unwrap_err();
        match err {
            ExecError::Handler { keyword, source } => {
                assert_eq!(keyword, "explode");
                assert_eq!(source.to_string(), "boom");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn run_and_bind_check_root_type() {
        let f = fixture();
        let mut host = EventLoop::new();
        let err = run(&tree(&f, "load create circle"), &mut host).unwrap_err();
        assert!(matches!(err, ExecError::NotRunnable { ty: Event, .. }));
        let err = bind(&tree(&f, "create circle"), &mut host).unwrap_err();
        assert!(matches!(err, ExecError::NotBindable { ty: Function, .. }));
    }

    #[test]
    fn nested_event_binds_when_outer_fires() {
        let f = fixture();
        let mut host = EventLoop::new();
        execute(&tree(&f, "load click banner create circle"), &mut host).unwrap();
        assert_eq!(host.len(), 1);

        host.fire(&BindTarget::host("document"), "load").unwrap();
        assert_eq!(host.len(), 2);
        assert_eq!(f.created.load(Ordering::SeqCst), 0);

        host.fire(&BindTarget::element("banner"), "click").unwrap();
        assert_eq!(f.created.load(Ordering::SeqCst), 1);
    }
}
