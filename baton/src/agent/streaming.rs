//! Streaming execution — the incremental counterpart to the buffered
//! engine.
//!
//! [`Runner::run_streamed`] spawns a producer task that performs the same
//! per-turn logic as the buffered path, consuming the model's response
//! incrementally and republishing progress through an unbounded FIFO
//! queue:
//!
//! - every provider event verbatim ([`RunEvent::Raw`]),
//! - synthesized semantic events ([`RunEvent::TextDelta`]),
//! - every produced run item, in order ([`RunEvent::ItemCreated`]),
//! - agent switches ([`RunEvent::AgentUpdated`]) and input-guardrail
//!   results as they resolve.
//!
//! The producer pushes a terminal sentinel on **every** exit path —
//! success, max turns, guardrail tripwire, or unexpected error — so the
//! consumer's iteration always terminates. Errors are recorded on the
//! [`StreamedRunResult`] instead of being thrown; callers check
//! [`StreamedRunResult::error`] after the event sequence ends.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use futures::StreamExt;
use futures::stream::FuturesUnordered;
use serde_json::Value;
use tracing::{Instrument, debug, error, info};

use crate::callback::{NoopRunHooks, RunContext, RunHooks};
use crate::error::{Error, Result};
use crate::guardrail::{
    InputGuardrail, InputGuardrailResult, OutputGuardrail, OutputGuardrailResult,
};
use crate::items::RunItem;
use crate::model::ToolChoice;
use crate::stream::{ModelStreamEvent, ResponseAccumulator};
use crate::usage::Usage;

use super::config::Agent;
use super::processor::process_model_response;
use super::result::{NextStep, RunConfig, RunInput};
use super::runner::{HookDispatch, Runner};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// One event published to the consumer of a streamed run.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum RunEvent {
    /// A provider-native stream event, republished verbatim.
    Raw(ModelStreamEvent),
    /// A semantic text delta synthesized from recognized raw events.
    TextDelta(String),
    /// A run item was produced, in canonical order.
    ItemCreated(RunItem),
    /// A handoff switched the active agent.
    AgentUpdated(Arc<Agent>),
    /// An input guardrail resolved without tripping.
    InputGuardrailResult(InputGuardrailResult),
}

enum QueueItem {
    Event(RunEvent),
    /// Terminal sentinel; pushed on every producer exit path.
    Complete,
}

impl std::fmt::Debug for QueueItem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Event(event) => f.debug_tuple("Event").field(event).finish(),
            Self::Complete => f.write_str("Complete"),
        }
    }
}

#[derive(Debug)]
struct StreamShared {
    error: Mutex<Option<Arc<Error>>>,
    final_output: Mutex<Option<Value>>,
    usage: Mutex<Usage>,
    new_items: Mutex<Vec<RunItem>>,
    input_guardrail_results: Mutex<Vec<InputGuardrailResult>>,
    output_guardrail_results: Mutex<Vec<OutputGuardrailResult>>,
    last_agent: Mutex<Arc<Agent>>,
    turns: AtomicUsize,
    complete: AtomicBool,
}

impl StreamShared {
    fn new(start_agent: Arc<Agent>) -> Self {
        Self {
            error: Mutex::new(None),
            final_output: Mutex::new(None),
            usage: Mutex::new(Usage::zero()),
            new_items: Mutex::new(Vec::new()),
            input_guardrail_results: Mutex::new(Vec::new()),
            output_guardrail_results: Mutex::new(Vec::new()),
            last_agent: Mutex::new(start_agent),
            turns: AtomicUsize::new(0),
            complete: AtomicBool::new(false),
        }
    }

    fn last_agent(&self) -> Arc<Agent> {
        Arc::clone(&self.last_agent.lock().expect("lock poisoned"))
    }
}

/// The live result of a streaming run.
///
/// Consume events with [`next_event`](Self::next_event) or
/// [`events`](Self::events); the sequence ends when the run reaches any
/// terminal state. Aggregate accessors reflect progress so far and the
/// final state once [`is_complete`](Self::is_complete) is `true`.
#[derive(Debug)]
pub struct StreamedRunResult {
    rx: mpsc::UnboundedReceiver<QueueItem>,
    shared: Arc<StreamShared>,
    handle: JoinHandle<()>,
    closed: bool,
}

impl StreamedRunResult {
    pub(crate) fn spawn(agent: Arc<Agent>, input: RunInput, config: RunConfig) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let shared = Arc::new(StreamShared::new(Arc::clone(&agent)));
        let span = Runner::run_span(&agent, &config);
        let producer_shared = Arc::clone(&shared);
        let handle = tokio::spawn(
            produce(agent, input, config, tx, producer_shared).instrument(span),
        );
        Self {
            rx,
            shared,
            handle,
            closed: false,
        }
    }

    /// Receive the next event, or `None` once the run has terminated.
    pub async fn next_event(&mut self) -> Option<RunEvent> {
        if self.closed {
            return None;
        }
        match self.rx.recv().await {
            Some(QueueItem::Event(event)) => Some(event),
            Some(QueueItem::Complete) | None => {
                self.closed = true;
                None
            }
        }
    }

    /// The ordered event sequence; finite on every exit path.
    pub fn events(&mut self) -> impl futures::Stream<Item = RunEvent> + Send + '_ {
        async_stream::stream! {
            while let Some(event) = self.next_event().await {
                yield event;
            }
        }
    }

    /// Returns `true` once the run has reached a terminal state.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.shared.complete.load(Ordering::SeqCst)
    }

    /// The error that ended the run, if any.
    ///
    /// The streaming path never throws; callers check this after the event
    /// sequence terminates.
    #[must_use]
    pub fn error(&self) -> Option<Arc<Error>> {
        self.shared.error.lock().expect("lock poisoned").clone()
    }

    /// The final output, once the run completed successfully.
    #[must_use]
    pub fn final_output(&self) -> Option<Value> {
        self.shared.final_output.lock().expect("lock poisoned").clone()
    }

    /// The final output rendered as text, once available.
    #[must_use]
    pub fn final_output_text(&self) -> Option<String> {
        self.final_output().map(|output| match output {
            Value::String(text) => text,
            other => other.to_string(),
        })
    }

    /// Accumulated usage so far.
    #[must_use]
    pub fn usage(&self) -> Usage {
        *self.shared.usage.lock().expect("lock poisoned")
    }

    /// Every item generated so far, in order.
    #[must_use]
    pub fn new_items(&self) -> Vec<RunItem> {
        self.shared.new_items.lock().expect("lock poisoned").clone()
    }

    /// The currently active (or final) agent.
    #[must_use]
    pub fn last_agent(&self) -> Arc<Agent> {
        self.shared.last_agent()
    }

    /// Number of turns started so far.
    #[must_use]
    pub fn turns(&self) -> usize {
        self.shared.turns.load(Ordering::SeqCst)
    }

    /// Results of input guardrails that completed without tripping.
    #[must_use]
    pub fn input_guardrail_results(&self) -> Vec<InputGuardrailResult> {
        self.shared
            .input_guardrail_results
            .lock()
            .expect("lock poisoned")
            .clone()
    }

    /// Results of output guardrails that completed without tripping.
    #[must_use]
    pub fn output_guardrail_results(&self) -> Vec<OutputGuardrailResult> {
        self.shared
            .output_guardrail_results
            .lock()
            .expect("lock poisoned")
            .clone()
    }

    /// Abort the producer task and terminate the event sequence.
    ///
    /// Already-launched side effects are not rolled back; the consumer's
    /// iteration ends as soon as the queue drains.
    pub fn cancel(&self) {
        self.handle.abort();
        self.shared.complete.store(true, Ordering::SeqCst);
    }
}

fn send(tx: &mpsc::UnboundedSender<QueueItem>, event: RunEvent) {
    // A dropped consumer is not an error; the producer keeps driving the
    // run to completion.
    let _ = tx.send(QueueItem::Event(event));
}

async fn produce(
    start_agent: Arc<Agent>,
    input: RunInput,
    config: RunConfig,
    tx: mpsc::UnboundedSender<QueueItem>,
    shared: Arc<StreamShared>,
) {
    let noop = NoopRunHooks;
    let run_hooks: &dyn RunHooks = config.hooks.as_deref().unwrap_or(&noop);

    let mut ctx = RunContext::new()
        .with_agent_name(start_agent.name())
        .with_context(config.context.clone());

    let outcome = turn_loop(
        &start_agent,
        input,
        &config,
        run_hooks,
        &mut ctx,
        &tx,
        &shared,
    )
    .await;

    if let Err(e) = outcome {
        error!(error = %e, "Streamed run failed");
        tracing::Span::current().record("error", tracing::field::display(&e));
        let current = shared.last_agent();
        HookDispatch::new(run_hooks, &current).error(&ctx, &e).await;
        *shared.error.lock().expect("lock poisoned") = Some(Arc::new(e));
    }

    shared.complete.store(true, Ordering::SeqCst);
    let _ = tx.send(QueueItem::Complete);
}

#[allow(clippy::too_many_arguments)]
async fn turn_loop(
    start_agent: &Arc<Agent>,
    input: RunInput,
    config: &RunConfig,
    run_hooks: &dyn RunHooks,
    ctx: &mut RunContext,
    tx: &mpsc::UnboundedSender<QueueItem>,
    shared: &Arc<StreamShared>,
) -> Result<()> {
    let mut current_agent = Arc::clone(start_agent);
    let mut original_input = input;
    let mut generated_items: Vec<RunItem> = Vec::new();
    let mut last_response_id = config.previous_response_id.clone();
    let mut force_auto_tool_choice = false;
    let max_turns = config.effective_max_turns();

    // Input guardrails run before turn 1, publishing each result through
    // the same queue as it resolves.
    let input_guardrails: Vec<InputGuardrail> = start_agent
        .get_input_guardrails()
        .iter()
        .chain(config.input_guardrails.iter())
        .cloned()
        .collect();
    let results =
        run_input_guardrails_streamed(&input_guardrails, ctx, start_agent, &original_input, tx)
            .await?;
    *shared
        .input_guardrail_results
        .lock()
        .expect("lock poisoned") = results;

    HookDispatch::new(run_hooks, &current_agent).agent_start(ctx).await;

    let mut turn = 0usize;
    loop {
        turn += 1;
        shared.turns.store(turn, Ordering::SeqCst);
        if turn > max_turns {
            return Err(Error::max_turns(max_turns));
        }
        ctx.advance_turn();
        debug!(agent = %current_agent.name(), turn, "Starting streamed turn");

        let merged_settings =
            Runner::merged_settings(&current_agent, config, force_auto_tool_choice);
        let forced_choice = matches!(
            merged_settings.tool_choice,
            Some(ToolChoice::Required | ToolChoice::Tool(_))
        );

        let prepared = Runner::prepare_turn(
            &current_agent,
            &original_input,
            &generated_items,
            ctx,
            config,
            last_response_id.clone(),
            merged_settings,
        )
        .await?;

        let hooks = HookDispatch::new(run_hooks, &current_agent);
        hooks
            .llm_start(
                ctx,
                prepared.request.system_instructions.as_deref(),
                &prepared.request.input,
            )
            .await;

        // Consume the provider stream, republishing every event verbatim
        // and synthesizing semantic text deltas, while assembling the same
        // ModelResponse the buffered path would have received.
        let mut stream = prepared.model.stream_response(prepared.request).await?;
        let mut accumulator = ResponseAccumulator::new();
        while let Some(event) = stream.next().await {
            let event = event?;
            send(tx, RunEvent::Raw(event.clone()));
            if let ModelStreamEvent::TextDelta { delta } = &event {
                send(tx, RunEvent::TextDelta(delta.clone()));
            }
            accumulator.apply(&event);
            if event.is_completed() {
                break;
            }
        }
        drop(stream);
        let response = accumulator.into_response()?;

        hooks.llm_end(ctx, &response).await;
        ctx.add_usage(response.usage);
        *shared.usage.lock().expect("lock poisoned") = *ctx.usage();
        last_response_id = response.response_id.clone();

        // From here on the decisions are byte-for-byte the buffered
        // engine's: same classifier, same executors, same next-step rules.
        let processed = process_model_response(
            &current_agent,
            &prepared.all_tools,
            current_agent.get_handoffs(),
            &response,
        )?;
        let step = Runner::finalize_turn(
            &current_agent,
            run_hooks,
            original_input.clone(),
            generated_items.clone(),
            response,
            processed,
            ctx,
            config,
        )
        .await?;

        for item in &step.new_turn_items {
            send(tx, RunEvent::ItemCreated(item.clone()));
        }

        let ran_tools = step
            .new_turn_items
            .iter()
            .any(|item| matches!(item, RunItem::ToolCallOutput(_)));
        if ran_tools && forced_choice && current_agent.resets_tool_choice() {
            force_auto_tool_choice = true;
        }

        original_input = step.original_input.clone();
        generated_items = step.generated_items();
        *shared.new_items.lock().expect("lock poisoned") = generated_items.clone();

        match step.next_step {
            NextStep::RunAgain => {}
            NextStep::Handoff { new_agent } => {
                current_agent = new_agent;
                ctx.set_agent_name(current_agent.name());
                force_auto_tool_choice = false;
                *shared.last_agent.lock().expect("lock poisoned") = Arc::clone(&current_agent);
                send(tx, RunEvent::AgentUpdated(Arc::clone(&current_agent)));
                HookDispatch::new(run_hooks, &current_agent).agent_start(ctx).await;
            }
            NextStep::FinalOutput { output } => {
                let output_guardrails: Vec<OutputGuardrail> = current_agent
                    .get_output_guardrails()
                    .iter()
                    .chain(config.output_guardrails.iter())
                    .cloned()
                    .collect();
                let results = Runner::run_output_guardrails(
                    &output_guardrails,
                    ctx,
                    &current_agent,
                    &output,
                )
                .await?;
                *shared
                    .output_guardrail_results
                    .lock()
                    .expect("lock poisoned") = results;

                HookDispatch::new(run_hooks, &current_agent).agent_end(ctx, &output).await;
                info!(
                    agent = %current_agent.name(),
                    turns = turn,
                    "Streamed run completed",
                );
                *shared.final_output.lock().expect("lock poisoned") = Some(output);
                return Ok(());
            }
        }
    }
}

/// Run the input-guardrail batch concurrently, publishing each resolved
/// result through the queue, then collate in issuance order.
async fn run_input_guardrails_streamed(
    guardrails: &[InputGuardrail],
    ctx: &RunContext,
    agent: &Arc<Agent>,
    input: &RunInput,
    tx: &mpsc::UnboundedSender<QueueItem>,
) -> Result<Vec<InputGuardrailResult>> {
    if guardrails.is_empty() {
        return Ok(Vec::new());
    }

    let mut pending: FuturesUnordered<_> = guardrails
        .iter()
        .enumerate()
        .map(|(index, guardrail)| async move { (index, guardrail.run(ctx, agent, input).await) })
        .collect();

    let mut settled: Vec<(usize, Result<InputGuardrailResult>)> =
        Vec::with_capacity(guardrails.len());
    while let Some((index, outcome)) = pending.next().await {
        if let Ok(result) = &outcome {
            send(tx, RunEvent::InputGuardrailResult(result.clone()));
        }
        settled.push((index, outcome));
    }
    drop(pending);

    settled.sort_by_key(|(index, _)| *index);
    let ordered = settled.into_iter().map(|(_, outcome)| outcome).collect();
    Runner::collate_input_guardrails(guardrails, ordered)
}
