//! The dispatch loop.
//!
//! For one inbound message the [`Dispatcher`] walks every message handler in
//! registration order, then every alias in registration order:
//!
//! ```text
//! message ─▶ split head ─▶ for each handler, then each alias:
//!                           match? ── no ──▶ next
//!                             │ yes
//!                             ▼
//!                           tokenize ── error ──▶ report, stop
//!                             ▼
//!                           parse ───── error ──▶ report, stop
//!                             ▼
//!                           open scope, inject
//!                             ▼
//!                           validate ── reject ─▶ release scope, next
//!                             ▼
//!                           body ─────── Err ───▶ release scope, fail
//!                             ▼
//!                           release scope
//!                             ▼
//!                           Flow::Stop ─▶ stop / Flow::Continue ─▶ next
//! ```
//!
//! Handlers of one message are evaluated strictly one after the other. Several
//! messages can be dispatched at the same time, each on its own task.

use std::sync::Arc;

use log::{debug, info};

use crate::{
    dispatch::{
        ContextSources, DispatchError, EventCategory, Flow, HandlerDescriptor, InvocationScope,
        Registry,
        error_response::{format_grammar_error, format_tokenization_error},
        inject, split_head, validator,
    },
    store::Store,
    transport::{IncomingMessage, Transport},
};

/// What happened while dispatching one message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchSummary {
    /// Handlers whose body ran, in order
    pub invoked: Vec<String>,
    /// Handlers skipped by their channel validator, in order
    pub rejected: Vec<String>,
    /// Whether the walk stopped before evaluating every handler and alias
    pub halted: bool,
}

/// Outcome of evaluating one handler against the message.
enum Step {
    Continue,
    Halt,
}

/// Routes inbound messages to registered handlers.
///
/// # Examples
///
/// ```no_run
/// # use std::sync::Arc;
/// # use strea::dispatch::{Dispatcher, RegistryBuilder};
/// # use strea::store::MemoryStore;
/// # use strea::transport::{ConsoleTransport, Transport};
/// # use strea::config::Console;
/// # async fn example() -> anyhow::Result<()> {
/// let console = Arc::new(ConsoleTransport::stdio(&Console::default()));
/// let transport: Arc<dyn Transport> = console.clone();
/// let dispatcher = Dispatcher::new(
///     Arc::new(RegistryBuilder::new().build()),
///     transport,
///     Arc::new(MemoryStore::new()),
///     "!",
/// );
///
/// while let Some(message) = console.next_message().await? {
///     let summary = dispatcher.dispatch(message).await?;
///     println!("invoked {:?}", summary.invoked);
/// }
/// # Ok(())
/// # }
/// ```
pub struct Dispatcher {
    registry: Arc<Registry>,
    transport: Arc<dyn Transport>,
    store: Arc<dyn Store>,
    /// Command prefix, e.g. `!`
    prefix: String,
}

impl Dispatcher {
    pub fn new(
        registry: Arc<Registry>,
        transport: Arc<dyn Transport>,
        store: Arc<dyn Store>,
        prefix: &str,
    ) -> Self {
        Dispatcher {
            registry,
            transport,
            store,
            prefix: prefix.to_string(),
        }
    }

    /// Dispatches one message to every matching handler.
    ///
    /// Parse failures are reported to the message's channel and end the dispatch
    /// successfully; they are not returned as errors.
    ///
    /// # Errors
    ///
    /// - [`DispatchError::Body`] when a handler body fails. The handler's scope is
    ///   released before the error is returned and no further handler runs.
    /// - [`DispatchError::Report`] when a parse failure can not be reported.
    pub async fn dispatch(
        &self,
        message: IncomingMessage,
    ) -> Result<DispatchSummary, DispatchError> {
        let message = Arc::new(message);
        let (head, rest) = split_head(&message.content);
        let mut summary = DispatchSummary::default();

        for descriptor in self.registry.handlers(EventCategory::Message) {
            let step = self
                .process(head, rest, descriptor.name(), descriptor, &message, &mut summary)
                .await?;
            if let Step::Halt = step {
                summary.halted = true;
                return Ok(summary);
            }
        }

        for (alias, descriptor) in self.registry.aliases(EventCategory::Message) {
            let step = self
                .process(head, rest, alias, descriptor, &message, &mut summary)
                .await?;
            if let Step::Halt = step {
                summary.halted = true;
                return Ok(summary);
            }
        }

        Ok(summary)
    }

    /// Evaluates one handler, reached through `name` (its own name or an alias).
    async fn process(
        &self,
        head: &str,
        rest: &str,
        name: &str,
        descriptor: &HandlerDescriptor,
        message: &Arc<IncomingMessage>,
        summary: &mut DispatchSummary,
    ) -> Result<Step, DispatchError> {
        if descriptor.is_command() && head.strip_prefix(self.prefix.as_str()) != Some(name) {
            return Ok(Step::Continue);
        }

        debug!("message matched handler `{}` as `{}`", descriptor.name(), name);

        let chunks = match descriptor.tokenization_mode().split(rest) {
            Ok(chunks) => chunks,
            Err(e) => {
                info!("unable to tokenize {:?} for `{}`: {}", rest, name, e);
                self.report(message, &format_tokenization_error(&e)).await?;
                return Ok(Step::Halt);
            }
        };

        let parsed = match descriptor.grammar().parse(&chunks) {
            Ok(parsed) => parsed,
            Err(e) => {
                info!("invalid input for `{}`: {}", name, e);
                self.report(message, &format_grammar_error(&e)).await?;
                return Ok(Step::Halt);
            }
        };

        let scope = InvocationScope::open(self.store.as_ref());
        let invocation = inject(
            descriptor.context(),
            parsed,
            ContextSources {
                transport: &self.transport,
                message,
                scope: &scope,
                raw: rest,
            },
        );

        if !validator::check(descriptor.validator(), &self.transport, message).await {
            debug!(
                "handler `{}` rejected channel `{}`",
                descriptor.name(),
                message.channel.name
            );
            summary.rejected.push(descriptor.name().to_string());
            scope.release();
            return Ok(Step::Continue);
        }

        summary.invoked.push(descriptor.name().to_string());
        let result = descriptor.call(invocation).await;
        scope.release();

        match result {
            Ok(Flow::Continue) => Ok(Step::Continue),
            Ok(Flow::Stop) => {
                debug!("handler `{}` stopped the dispatch", descriptor.name());
                Ok(Step::Halt)
            }
            Err(source) => Err(DispatchError::Body {
                handler: descriptor.name().to_string(),
                source,
            }),
        }
    }

    /// Sends a parse failure to the message's channel.
    async fn report(&self, message: &IncomingMessage, body: &str) -> Result<(), DispatchError> {
        self.transport
            .send(&message.channel.id, body)
            .await
            .map_err(|source| DispatchError::Report {
                channel: message.channel.id.clone(),
                source,
            })
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::{Arc, Mutex},
        time::Duration,
    };

    use super::*;
    use crate::{
        dispatch::{
            ContextParam, RegistryBuilder, Tokenization, only,
            grammar::{ArgumentRule, Arity},
        },
        store::MemoryStore,
        transport::{Channel, MockTransport},
    };

    type Calls = Arc<Mutex<Vec<String>>>;

    fn create_message(content: &str) -> IncomingMessage {
        IncomingMessage {
            content: content.to_string(),
            author: "alice".to_string(),
            channel: Channel {
                id: "c1".to_string(),
                name: "general".to_string(),
                is_private: false,
            },
        }
    }

    fn silent_transport() -> MockTransport {
        let mut transport = MockTransport::new();
        transport.expect_send().times(0);
        transport
    }

    fn error_transport(expected_prefix: &'static str) -> MockTransport {
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .withf(move |channel, body| channel == "c1" && body.starts_with(expected_prefix))
            .times(1)
            .returning(|_, _| Ok(()));
        transport
    }

    fn command(name: &str, calls: &Calls, flow: Flow) -> HandlerDescriptor {
        let calls = Arc::clone(calls);
        let label = name.to_string();
        HandlerDescriptor::command(name, move |_| {
            calls.lock().unwrap().push(label.clone());
            async move { Ok(flow) }
        })
    }

    fn listener(name: &str, calls: &Calls, flow: Flow) -> HandlerDescriptor {
        let calls = Arc::clone(calls);
        let label = name.to_string();
        HandlerDescriptor::listener(name, move |_| {
            calls.lock().unwrap().push(label.clone());
            async move { Ok(flow) }
        })
        .tokenization(Tokenization::Plain)
    }

    fn create_dispatcher(
        descriptors: Vec<HandlerDescriptor>,
        transport: MockTransport,
        store: &Arc<MemoryStore>,
    ) -> Dispatcher {
        let mut builder = RegistryBuilder::new();
        for descriptor in descriptors {
            builder.register(EventCategory::Message, descriptor).unwrap();
        }
        let store: Arc<dyn Store> = Arc::clone(store) as Arc<dyn Store>;
        Dispatcher::new(Arc::new(builder.build()), Arc::new(transport), store, "!")
    }

    fn recorded(calls: &Calls) -> Vec<String> {
        calls.lock().unwrap().clone()
    }

    #[tokio::test]
    async fn test_command_matches_exact_name_only() {
        let calls = Calls::default();
        let store = Arc::new(MemoryStore::new());
        let dispatcher = create_dispatcher(
            vec![
                command("ping", &calls, Flow::Continue),
                command("pingpong", &calls, Flow::Continue),
            ],
            silent_transport(),
            &store,
        );

        let summary = dispatcher.dispatch(create_message("!pingpong 1 2")).await.unwrap();
        assert_eq!(summary.invoked, vec!["pingpong"]);
        assert!(!summary.halted);

        dispatcher.dispatch(create_message("!ping")).await.unwrap();
        assert_eq!(recorded(&calls), vec!["pingpong", "ping"]);
    }

    #[tokio::test]
    async fn test_non_matching_message_is_not_an_error() {
        let calls = Calls::default();
        let store = Arc::new(MemoryStore::new());
        let dispatcher = create_dispatcher(
            vec![command("ping", &calls, Flow::Stop)],
            silent_transport(),
            &store,
        );

        for content in ["ping", "hello there", "", "!pin", "?ping"] {
            let summary = dispatcher.dispatch(create_message(content)).await.unwrap();
            assert_eq!(summary, DispatchSummary::default());
        }
        assert!(recorded(&calls).is_empty());
        assert_eq!(store.opened_sessions(), 0);
    }

    #[tokio::test]
    async fn test_alias_invokes_canonical_handler() {
        let calls = Calls::default();
        let store = Arc::new(MemoryStore::new());
        let dispatcher = create_dispatcher(
            vec![
                command("character", &calls, Flow::Stop).alias("char"),
                command("weapon", &calls, Flow::Stop).alias("wp"),
            ],
            silent_transport(),
            &store,
        );

        let summary = dispatcher.dispatch(create_message("!wp hot spring")).await.unwrap();

        assert_eq!(summary.invoked, vec!["weapon"]);
        assert!(summary.halted);
        assert_eq!(recorded(&calls), vec!["weapon"]);
    }

    #[tokio::test]
    async fn test_stop_halts_later_handlers_and_aliases() {
        let calls = Calls::default();
        let store = Arc::new(MemoryStore::new());
        let dispatcher = create_dispatcher(
            vec![
                listener("before", &calls, Flow::Continue),
                command("stop", &calls, Flow::Stop),
                listener("after", &calls, Flow::Continue).alias("after-alias"),
            ],
            silent_transport(),
            &store,
        );

        let summary = dispatcher.dispatch(create_message("!stop")).await.unwrap();

        assert!(summary.halted);
        assert_eq!(recorded(&calls), vec!["before", "stop"]);
    }

    #[tokio::test]
    async fn test_stop_in_alias_pass_skips_later_aliases() {
        let calls = Calls::default();
        let store = Arc::new(MemoryStore::new());
        let dispatcher = create_dispatcher(
            vec![
                listener("watch", &calls, Flow::Continue).alias("w"),
                command("s", &calls, Flow::Stop).alias("s1"),
                listener("tail", &calls, Flow::Continue).alias("t"),
            ],
            silent_transport(),
            &store,
        );

        let summary = dispatcher.dispatch(create_message("!s1")).await.unwrap();

        assert!(summary.halted);
        assert_eq!(summary.invoked, vec!["watch", "tail", "watch", "s"]);
        assert_eq!(recorded(&calls), vec!["watch", "tail", "watch", "s"]);
        assert_eq!(store.opened_sessions(), 4);
        assert_eq!(store.active_sessions(), 0);
    }

    #[tokio::test]
    async fn test_continue_lets_later_handlers_run() {
        let calls = Calls::default();
        let store = Arc::new(MemoryStore::new());
        let dispatcher = create_dispatcher(
            vec![
                command("first", &calls, Flow::Continue),
                listener("after", &calls, Flow::Continue),
            ],
            silent_transport(),
            &store,
        );

        let summary = dispatcher.dispatch(create_message("!first")).await.unwrap();

        assert!(!summary.halted);
        assert_eq!(recorded(&calls), vec!["first", "after"]);
    }

    #[tokio::test]
    async fn test_listener_with_alias_runs_twice() {
        let calls = Calls::default();
        let store = Arc::new(MemoryStore::new());
        let dispatcher = create_dispatcher(
            vec![listener("watch", &calls, Flow::Continue).alias("w")],
            silent_transport(),
            &store,
        );

        let summary = dispatcher.dispatch(create_message("anything")).await.unwrap();

        assert_eq!(summary.invoked, vec!["watch", "watch"]);
        assert_eq!(store.opened_sessions(), 2);
        assert_eq!(store.active_sessions(), 0);
    }

    #[tokio::test]
    async fn test_unbalanced_quotes_report_once_and_stop() {
        let calls = Calls::default();
        let store = Arc::new(MemoryStore::new());
        let dispatcher = create_dispatcher(
            vec![
                listener("before", &calls, Flow::Continue),
                command("scout", &calls, Flow::Continue)
                    .alias("sc")
                    .argument(ArgumentRule::new("title").arity(Arity::RemainderConcatenated)),
                listener("after", &calls, Flow::Continue),
            ],
            error_transport("*Error*: Can not parse this command"),
            &store,
        );

        let summary = dispatcher
            .dispatch(create_message("!scout \"hot spring"))
            .await
            .unwrap();

        assert!(summary.halted);
        assert_eq!(recorded(&calls), vec!["before"]);
        // No scope is opened for a message that failed to parse
        assert_eq!(store.opened_sessions(), 1);
    }

    #[tokio::test]
    async fn test_grammar_error_reports_rule_message_and_stops() {
        let calls = Calls::default();
        let store = Arc::new(MemoryStore::new());
        let dispatcher = create_dispatcher(
            vec![
                command("scout", &calls, Flow::Continue).argument(
                    ArgumentRule::new("title")
                        .arity(Arity::RemainderConcatenated)
                        .count_error("Please give a scout title"),
                ),
                listener("after", &calls, Flow::Continue),
            ],
            error_transport("*Error*\nPlease give a scout title"),
            &store,
        );

        let summary = dispatcher.dispatch(create_message("!scout")).await.unwrap();

        assert!(summary.halted);
        assert!(summary.invoked.is_empty());
        assert!(recorded(&calls).is_empty());
        assert_eq!(store.opened_sessions(), 0);
    }

    #[tokio::test]
    async fn test_report_failure_is_returned() {
        let store = Arc::new(MemoryStore::new());
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .times(1)
            .returning(|_, _| Err(anyhow::anyhow!("connection lost")));
        let dispatcher = create_dispatcher(
            vec![HandlerDescriptor::command("scout", |_| async { Ok(Flow::Stop) })
                .argument(ArgumentRule::new("title"))],
            transport,
            &store,
        );

        let result = dispatcher.dispatch(create_message("!scout")).await;

        assert!(matches!(result, Err(DispatchError::Report { channel, .. }) if channel == "c1"));
    }

    #[tokio::test]
    async fn test_validator_rejection_continues_silently() {
        let calls = Calls::default();
        let store = Arc::new(MemoryStore::new());
        let dispatcher = create_dispatcher(
            vec![
                command("memo", &calls, Flow::Stop).channels(only(&["memo"], true)),
                listener("after", &calls, Flow::Continue),
            ],
            silent_transport(),
            &store,
        );

        let summary = dispatcher.dispatch(create_message("!memo key")).await.unwrap();

        assert_eq!(summary.rejected, vec!["memo"]);
        assert_eq!(summary.invoked, vec!["after"]);
        assert!(!summary.halted);
        assert_eq!(recorded(&calls), vec!["after"]);
        assert_eq!(store.opened_sessions(), 2);
        assert_eq!(store.released_sessions(), 2);
    }

    #[tokio::test]
    async fn test_body_failure_releases_scope_and_propagates() {
        let calls = Calls::default();
        let store = Arc::new(MemoryStore::new());
        let dispatcher = create_dispatcher(
            vec![
                HandlerDescriptor::command("broken", |_| async {
                    Err(anyhow::anyhow!("database is on fire"))
                }),
                listener("after", &calls, Flow::Continue),
            ],
            silent_transport(),
            &store,
        );

        let result = dispatcher.dispatch(create_message("!broken")).await;

        match result {
            Err(DispatchError::Body { handler, source }) => {
                assert_eq!(handler, "broken");
                assert_eq!(source.to_string(), "database is on fire");
            }
            other => panic!("Expected a body failure, got {:?}", other),
        }
        assert!(recorded(&calls).is_empty());
        assert_eq!(store.opened_sessions(), 1);
        assert_eq!(store.released_sessions(), 1);
    }

    #[tokio::test]
    async fn test_scope_released_once_per_invocation() {
        let calls = Calls::default();
        let store = Arc::new(MemoryStore::new());
        let dispatcher = create_dispatcher(
            vec![
                listener("one", &calls, Flow::Continue),
                listener("two", &calls, Flow::Continue),
                command("three", &calls, Flow::Stop),
            ],
            silent_transport(),
            &store,
        );

        dispatcher.dispatch(create_message("!three")).await.unwrap();

        assert_eq!(store.opened_sessions(), 3);
        assert_eq!(store.released_sessions(), 3);
    }

    #[tokio::test]
    async fn test_cancelled_dispatch_releases_scope() {
        let store = Arc::new(MemoryStore::new());
        let dispatcher = create_dispatcher(
            vec![HandlerDescriptor::command("hang", |_| async {
                futures::future::pending::<()>().await;
                Ok(Flow::Stop)
            })],
            silent_transport(),
            &store,
        );

        let result =
            tokio::time::timeout(Duration::from_millis(20), dispatcher.dispatch(create_message("!hang")))
                .await;

        assert!(result.is_err());
        assert_eq!(store.opened_sessions(), 1);
        assert_eq!(store.active_sessions(), 0);
    }

    #[tokio::test]
    async fn test_injected_context() {
        let seen: Arc<Mutex<Option<(String, Vec<String>, String, bool)>>> = Arc::default();
        let seen_in_body = Arc::clone(&seen);
        let store = Arc::new(MemoryStore::new());
        let dispatcher = create_dispatcher(
            vec![HandlerDescriptor::command("memo", move |invocation| {
                let raw = invocation.raw().unwrap_or_default().to_string();
                let remainder = invocation.remainder().unwrap_or_default().to_vec();
                let key = invocation.text("key").unwrap_or_default().to_string();
                let has_session = invocation.session().is_some();
                *seen_in_body.lock().unwrap() = Some((raw, remainder, key, has_session));
                async { Ok(Flow::Stop) }
            })
            .tokenization(Tokenization::Plain)
            .argument(ArgumentRule::new("key"))
            .requires(&[ContextParam::Raw, ContextParam::Remainder])],
            silent_transport(),
            &store,
        );

        dispatcher.dispatch(create_message("!memo   k  a b")).await.unwrap();

        let (raw, remainder, key, has_session) = seen.lock().unwrap().clone().unwrap();
        assert_eq!(raw, "k  a b");
        assert_eq!(remainder, vec!["a", "b"]);
        assert_eq!(key, "k");
        assert!(!has_session);
    }

    #[tokio::test]
    async fn test_handler_sees_earlier_side_effects() {
        let store = Arc::new(MemoryStore::new());
        let writer = HandlerDescriptor::listener("writer", |invocation| async move {
            let session = invocation.session().cloned().unwrap();
            session.put("seen", "yes")?;
            session.commit()?;
            Ok(Flow::Continue)
        })
        .tokenization(Tokenization::Plain)
        .requires(&[ContextParam::Scope]);
        let reader = HandlerDescriptor::command("read", |invocation| async move {
            let session = invocation.session().cloned().unwrap();
            anyhow::ensure!(
                session.get("seen").as_deref() == Some("yes"),
                "listener write not visible"
            );
            Ok(Flow::Stop)
        })
        .requires(&[ContextParam::Scope]);
        let dispatcher = create_dispatcher(vec![writer, reader], silent_transport(), &store);

        let summary = dispatcher.dispatch(create_message("!read")).await.unwrap();

        assert_eq!(summary.invoked, vec!["writer", "read"]);
    }
}
