//! Runner — the turn-based execution engine.
//!
//! The [`Runner`] drives an [`Agent`] through repeated model invocations:
//!
//! 1. On turn 1, run input guardrails; a tripped tripwire aborts before any
//!    model call.
//! 2. Resolve the model, merged settings, and the flattened tool list.
//! 3. Invoke the model with instructions, the accumulated input, tools,
//!    output contract, and handoff descriptors.
//! 4. Classify the response; execute tool calls and computer actions.
//! 5. Honor at most one handoff, switching the active agent.
//! 6. Otherwise decide whether tool results or message text constitute a
//!    final output; if so run output guardrails and return.
//! 7. Otherwise loop, up to the configured turn budget.
//!
//! `Runner` owns no state — all per-run state lives in local variables of
//! the run functions, so the same agent can run concurrently with
//! different inputs.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use futures::future::join_all;
use serde_json::Value;
use tracing::{Instrument, debug, error, info, info_span, warn};

use crate::callback::{AgentHooks, NoopRunHooks, RunContext, RunHooks};
use crate::error::{Error, Result};
use crate::guardrail::{
    InputGuardrail, InputGuardrailResult, OutputGuardrail, OutputGuardrailResult,
};
use crate::items::{ModelResponse, ResponseItem, RunItem};
use crate::model::{ModelRequest, ModelSettings, ModelTracing, SharedModel, ToolChoice};
use crate::tool::{FunctionTool, ServerToolHandler, Tool, ToolDefinition};

use super::config::Agent;
use super::executor;
use super::processor::{ProcessedResponse, process_model_response};
use super::result::{NextStep, RunConfig, RunInput, RunResult, SingleStepResult};
use super::streaming::StreamedRunResult;

/// Dispatches one lifecycle event to both hook layers: the run-level hooks
/// and the current agent's own hooks.
pub(crate) struct HookDispatch<'a> {
    run: &'a dyn RunHooks,
    agent: Option<&'a dyn AgentHooks>,
    agent_name: &'a str,
}

impl<'a> HookDispatch<'a> {
    pub(crate) fn new(run: &'a dyn RunHooks, agent: &'a Agent) -> Self {
        Self {
            run,
            agent: agent.get_hooks(),
            agent_name: agent.name(),
        }
    }

    pub(crate) async fn agent_start(&self, ctx: &RunContext) {
        match self.agent {
            Some(agent) => {
                tokio::join!(self.run.on_agent_start(ctx, self.agent_name), agent.on_start(ctx));
            }
            None => self.run.on_agent_start(ctx, self.agent_name).await,
        }
    }

    pub(crate) async fn agent_end(&self, ctx: &RunContext, output: &Value) {
        match self.agent {
            Some(agent) => {
                tokio::join!(
                    self.run.on_agent_end(ctx, self.agent_name, output),
                    agent.on_end(ctx, output)
                );
            }
            None => self.run.on_agent_end(ctx, self.agent_name, output).await,
        }
    }

    pub(crate) async fn llm_start(
        &self,
        ctx: &RunContext,
        system_prompt: Option<&str>,
        input: &[ResponseItem],
    ) {
        match self.agent {
            Some(agent) => {
                tokio::join!(
                    self.run
                        .on_llm_start(ctx, self.agent_name, system_prompt, input),
                    agent.on_llm_start(ctx, system_prompt, input)
                );
            }
            None => {
                self.run
                    .on_llm_start(ctx, self.agent_name, system_prompt, input)
                    .await;
            }
        }
    }

    pub(crate) async fn llm_end(&self, ctx: &RunContext, response: &ModelResponse) {
        match self.agent {
            Some(agent) => {
                tokio::join!(
                    self.run.on_llm_end(ctx, self.agent_name, response),
                    agent.on_llm_end(ctx, response)
                );
            }
            None => self.run.on_llm_end(ctx, self.agent_name, response).await,
        }
    }

    pub(crate) async fn tool_start(&self, ctx: &RunContext, tool_name: &str) {
        match self.agent {
            Some(agent) => {
                tokio::join!(
                    self.run.on_tool_start(ctx, self.agent_name, tool_name),
                    agent.on_tool_start(ctx, tool_name)
                );
            }
            None => self.run.on_tool_start(ctx, self.agent_name, tool_name).await,
        }
    }

    pub(crate) async fn tool_end(&self, ctx: &RunContext, tool_name: &str, result: &str) {
        match self.agent {
            Some(agent) => {
                tokio::join!(
                    self.run
                        .on_tool_end(ctx, self.agent_name, tool_name, result),
                    agent.on_tool_end(ctx, tool_name, result)
                );
            }
            None => {
                self.run
                    .on_tool_end(ctx, self.agent_name, tool_name, result)
                    .await;
            }
        }
    }

    pub(crate) async fn handoff(&self, ctx: &RunContext, from_agent: &str, to_agent: &str) {
        match self.agent {
            Some(agent) => {
                tokio::join!(
                    self.run.on_handoff(ctx, from_agent, to_agent),
                    agent.on_handoff(ctx, to_agent)
                );
            }
            None => self.run.on_handoff(ctx, from_agent, to_agent).await,
        }
    }

    pub(crate) async fn error(&self, ctx: &RunContext, err: &Error) {
        match self.agent {
            Some(agent) => {
                tokio::join!(
                    self.run.on_error(ctx, self.agent_name, err),
                    agent.on_error(ctx, err)
                );
            }
            None => self.run.on_error(ctx, self.agent_name, err).await,
        }
    }
}

/// Everything resolved before one model invocation.
pub(crate) struct PreparedTurn {
    pub(crate) model: SharedModel,
    pub(crate) request: ModelRequest,
    pub(crate) all_tools: Vec<Tool>,
}

/// Stateless execution engine that drives an [`Agent`] through its turn
/// loop.
#[derive(Debug, Clone, Copy)]
pub struct Runner;

impl Runner {
    /// Execute an agent run to completion, returning one aggregate result.
    ///
    /// # Errors
    ///
    /// Returns [`Error::User`] if no model is configured,
    /// [`Error::MaxTurnsExceeded`] if the turn budget is exhausted, a
    /// guardrail tripwire error, or any propagated model/tool error.
    pub fn run<'a>(
        agent: &'a Arc<Agent>,
        input: impl Into<RunInput>,
        config: RunConfig,
    ) -> Pin<Box<dyn Future<Output = Result<RunResult>> + Send + 'a>> {
        let input = input.into();
        let span = Self::run_span(agent, &config);
        Box::pin(Self::run_inner(Arc::clone(agent), input, config).instrument(span))
    }

    /// Execute an agent run in streaming mode.
    ///
    /// Returns immediately with a [`StreamedRunResult`] whose event
    /// sequence republishes every model event and every produced run item
    /// in order, terminating on every exit path. Errors are recorded on
    /// the result instead of being returned.
    pub fn run_streamed(
        agent: &Arc<Agent>,
        input: impl Into<RunInput>,
        config: RunConfig,
    ) -> StreamedRunResult {
        StreamedRunResult::spawn(Arc::clone(agent), input.into(), config)
    }

    pub(crate) fn run_span(agent: &Agent, config: &RunConfig) -> tracing::Span {
        if config.tracing_disabled {
            return tracing::Span::none();
        }
        let trace_id = config
            .trace_id
            .clone()
            .unwrap_or_else(|| format!("trace_{}", uuid::Uuid::new_v4().simple()));
        info_span!(
            "run",
            workflow = %config.workflow_name,
            trace_id = %trace_id,
            group_id = config.group_id.as_deref().unwrap_or(""),
            metadata = ?config.metadata,
            agent.start = %agent.name(),
            run.turns = tracing::field::Empty,
            error = tracing::field::Empty,
        )
    }

    async fn run_inner(
        start_agent: Arc<Agent>,
        input: RunInput,
        config: RunConfig,
    ) -> Result<RunResult> {
        let noop = NoopRunHooks;
        let run_hooks: &dyn RunHooks = config.hooks.as_deref().unwrap_or(&noop);

        let mut ctx = RunContext::new()
            .with_agent_name(start_agent.name())
            .with_context(config.context.clone());
        let mut current_agent = Arc::clone(&start_agent);
        let mut original_input = input;
        let mut generated_items: Vec<RunItem> = Vec::new();
        let mut raw_responses: Vec<ModelResponse> = Vec::new();
        let mut last_response_id = config.previous_response_id.clone();
        let mut force_auto_tool_choice = false;
        let max_turns = config.effective_max_turns();

        // Input guardrails run once, for the agent the run started with,
        // before any model call.
        let input_guardrails: Vec<InputGuardrail> = start_agent
            .get_input_guardrails()
            .iter()
            .chain(config.input_guardrails.iter())
            .cloned()
            .collect();
        let input_guardrail_results = match Self::run_input_guardrails(
            &input_guardrails,
            &ctx,
            &start_agent,
            &original_input,
        )
        .await
        {
            Ok(results) => results,
            Err(e) => {
                HookDispatch::new(run_hooks, &start_agent).error(&ctx, &e).await;
                tracing::Span::current().record("error", tracing::field::display(&e));
                return Err(e);
            }
        };

        HookDispatch::new(run_hooks, &current_agent).agent_start(&ctx).await;

        let mut turn = 0usize;
        loop {
            turn += 1;
            if turn > max_turns {
                let err = Error::max_turns(max_turns);
                error!(agent = %current_agent.name(), max_turns, "Max turns exceeded");
                tracing::Span::current().record("error", tracing::field::display(&err));
                HookDispatch::new(run_hooks, &current_agent).error(&ctx, &err).await;
                return Err(err);
            }
            ctx.advance_turn();
            debug!(agent = %current_agent.name(), turn, "Starting turn");

            let merged_settings =
                Self::merged_settings(&current_agent, &config, force_auto_tool_choice);
            let forced_choice = matches!(
                merged_settings.tool_choice,
                Some(ToolChoice::Required | ToolChoice::Tool(_))
            );

            let agent_span = info_span!(
                "agent",
                agent.name = %current_agent.name(),
                turn,
            );
            let step = match Self::run_single_turn(
                &current_agent,
                run_hooks,
                &original_input,
                &generated_items,
                &mut ctx,
                &config,
                last_response_id.clone(),
                merged_settings,
            )
            .instrument(agent_span)
            .await
            {
                Ok(step) => step,
                Err(e) => {
                    tracing::Span::current().record("error", tracing::field::display(&e));
                    HookDispatch::new(run_hooks, &current_agent).error(&ctx, &e).await;
                    return Err(e);
                }
            };

            last_response_id = step.model_response.response_id.clone();
            raw_responses.push(step.model_response.clone());

            let ran_tools = step
                .new_turn_items
                .iter()
                .any(|item| matches!(item, RunItem::ToolCallOutput(_)));
            if ran_tools && forced_choice && current_agent.resets_tool_choice() {
                // A forced tool choice would make the model call the same
                // tool forever; subsequent turns fall back to auto.
                force_auto_tool_choice = true;
            }

            original_input = step.original_input.clone();
            generated_items = step.generated_items();

            match step.next_step {
                NextStep::RunAgain => {}
                NextStep::Handoff { new_agent } => {
                    current_agent = new_agent;
                    ctx.set_agent_name(current_agent.name());
                    force_auto_tool_choice = false;
                    HookDispatch::new(run_hooks, &current_agent).agent_start(&ctx).await;
                }
                NextStep::FinalOutput { output } => {
                    // Output guardrails: the final agent's own plus the
                    // run-wide ones, once, before the result is returned.
                    let output_guardrails: Vec<OutputGuardrail> = current_agent
                        .get_output_guardrails()
                        .iter()
                        .chain(config.output_guardrails.iter())
                        .cloned()
                        .collect();
                    let output_guardrail_results = match Self::run_output_guardrails(
                        &output_guardrails,
                        &ctx,
                        &current_agent,
                        &output,
                    )
                    .await
                    {
                        Ok(results) => results,
                        Err(e) => {
                            tracing::Span::current()
                                .record("error", tracing::field::display(&e));
                            HookDispatch::new(run_hooks, &current_agent).error(&ctx, &e).await;
                            return Err(e);
                        }
                    };

                    HookDispatch::new(run_hooks, &current_agent)
                        .agent_end(&ctx, &output)
                        .await;
                    tracing::Span::current().record("run.turns", turn);
                    info!(
                        agent = %current_agent.name(),
                        turns = turn,
                        input_tokens = ctx.usage().input_tokens,
                        output_tokens = ctx.usage().output_tokens,
                        "Run completed",
                    );

                    return Ok(RunResult {
                        input: original_input,
                        new_items: generated_items,
                        raw_responses,
                        final_output: output,
                        input_guardrail_results,
                        output_guardrail_results,
                        last_agent: current_agent,
                        last_response_id,
                        usage: *ctx.usage(),
                        turns: turn,
                    });
                }
            }
        }
    }

    /// Merge agent-default and run-override settings for one turn.
    pub(crate) fn merged_settings(
        agent: &Agent,
        config: &RunConfig,
        force_auto_tool_choice: bool,
    ) -> ModelSettings {
        let defaults = ModelSettings::default();
        let overrides = config.model_settings.as_ref().unwrap_or(&defaults);
        let mut settings = agent.get_model_settings().resolve(overrides);
        if force_auto_tool_choice {
            settings.tool_choice = Some(ToolChoice::Auto);
        }
        settings
    }

    /// Resolve model, tools, and the request for one turn.
    pub(crate) async fn prepare_turn(
        agent: &Arc<Agent>,
        original_input: &RunInput,
        generated_items: &[RunItem],
        ctx: &RunContext,
        config: &RunConfig,
        previous_response_id: Option<String>,
        mut settings: ModelSettings,
    ) -> Result<PreparedTurn> {
        let model = config
            .model
            .clone()
            .or_else(|| agent.get_model().cloned())
            .ok_or_else(|| {
                Error::user(format!(
                    "agent '{}' has no model configured and the run provides no override",
                    agent.name()
                ))
            })?;

        let all_tools = Self::collect_tools(agent).await?;

        let mut tools: Vec<ToolDefinition> = all_tools.iter().map(Tool::definition).collect();
        tools.extend(agent.get_handoffs().iter().map(super::handoff::Handoff::definition));

        if !tools.is_empty() && settings.tool_choice.is_none() {
            settings.tool_choice = Some(ToolChoice::Auto);
        }

        let mut input = original_input.to_items();
        input.extend(generated_items.iter().map(RunItem::to_input_item));

        let tracing = if config.tracing_disabled {
            ModelTracing::Disabled
        } else if config.trace_include_sensitive_data {
            ModelTracing::Enabled
        } else {
            ModelTracing::EnabledWithoutSensitiveData
        };

        let request = ModelRequest {
            system_instructions: agent.resolve_instructions(ctx),
            input,
            settings,
            tools,
            output_schema: agent.get_output_schema().cloned(),
            tracing,
            previous_response_id,
        };

        Ok(PreparedTurn {
            model,
            request,
            all_tools,
        })
    }

    /// One buffered turn: model call, classification, side effects.
    #[allow(clippy::too_many_arguments)]
    async fn run_single_turn(
        agent: &Arc<Agent>,
        run_hooks: &dyn RunHooks,
        original_input: &RunInput,
        generated_items: &[RunItem],
        ctx: &mut RunContext,
        config: &RunConfig,
        previous_response_id: Option<String>,
        settings: ModelSettings,
    ) -> Result<SingleStepResult> {
        let prepared = Self::prepare_turn(
            agent,
            original_input,
            generated_items,
            ctx,
            config,
            previous_response_id,
            settings,
        )
        .await?;

        let hooks = HookDispatch::new(run_hooks, agent);
        hooks
            .llm_start(
                ctx,
                prepared.request.system_instructions.as_deref(),
                &prepared.request.input,
            )
            .await;

        let response = prepared.model.get_response(prepared.request).await.map_err(|e| {
            error!(agent = %agent.name(), error = %e, "Model call failed");
            e
        })?;

        hooks.llm_end(ctx, &response).await;
        ctx.add_usage(response.usage);

        let processed =
            process_model_response(agent, &prepared.all_tools, agent.get_handoffs(), &response)?;

        Self::finalize_turn(
            agent,
            run_hooks,
            original_input.clone(),
            generated_items.to_vec(),
            response,
            processed,
            ctx,
            config,
        )
        .await
    }

    /// Execute a classified response's side effects and decide the next
    /// step. Shared verbatim between the buffered and streaming paths.
    #[allow(clippy::too_many_arguments)]
    pub(crate) async fn finalize_turn(
        agent: &Arc<Agent>,
        run_hooks: &dyn RunHooks,
        original_input: RunInput,
        pre_turn_items: Vec<RunItem>,
        model_response: ModelResponse,
        processed: ProcessedResponse,
        ctx: &RunContext,
        config: &RunConfig,
    ) -> Result<SingleStepResult> {
        let hooks = HookDispatch::new(run_hooks, agent);
        let include_sensitive = config.trace_include_sensitive_data;

        let ProcessedResponse {
            mut new_items,
            handoffs,
            functions,
            computer_actions,
            tools_used: _,
        } = processed;

        let function_results = executor::execute_function_tool_calls(
            agent,
            &functions,
            ctx,
            &hooks,
            include_sensitive,
        )
        .await?;
        new_items.extend(function_results.iter().map(|r| r.item.clone()));

        let computer_items = executor::execute_computer_actions(
            agent,
            &computer_actions,
            ctx,
            &hooks,
            include_sensitive,
        )
        .await?;
        let ran_computer = !computer_items.is_empty();
        new_items.extend(computer_items);

        if !handoffs.is_empty() {
            return executor::execute_handoffs(
                agent,
                handoffs,
                original_input,
                pre_turn_items,
                new_items,
                model_response,
                ctx,
                &hooks,
                config,
            )
            .await;
        }

        // Tool results alone may constitute the final output, per the
        // agent's tool-use policy.
        if let Some(output) = executor::check_tool_use_result(agent, ctx, &function_results).await?
        {
            return Ok(SingleStepResult {
                original_input,
                model_response,
                pre_turn_items,
                new_turn_items: new_items,
                next_step: NextStep::FinalOutput { output },
            });
        }

        let ran_tools = !function_results.is_empty() || ran_computer;
        let last_text = new_items.iter().rev().find_map(|item| match item {
            RunItem::Message(message) => message.raw.message_text(),
            _ => None,
        });

        let next_step = if ran_tools {
            NextStep::RunAgain
        } else {
            match agent.get_output_schema() {
                Some(schema) => match last_text {
                    Some(text) if !text.is_empty() => NextStep::FinalOutput {
                        output: schema.validate(&text)?,
                    },
                    _ => NextStep::RunAgain,
                },
                None => NextStep::FinalOutput {
                    output: Value::String(last_text.unwrap_or_default()),
                },
            }
        };

        Ok(SingleStepResult {
            original_input,
            model_response,
            pre_turn_items,
            new_turn_items: new_items,
            next_step,
        })
    }

    /// Flatten the agent's own tools with the tools its servers expose.
    pub(crate) async fn collect_tools(agent: &Arc<Agent>) -> Result<Vec<Tool>> {
        let mut tools = agent.get_tools().to_vec();
        for server in agent.get_tool_servers() {
            let definitions = server.list_tools().await.map_err(Error::Tool)?;
            for def in definitions {
                tools.push(Tool::Function(FunctionTool::new(
                    def.name.clone(),
                    def.description,
                    def.parameters,
                    ServerToolHandler {
                        server: Arc::clone(server),
                        tool: def.name,
                    },
                )));
            }
        }
        Ok(tools)
    }

    /// Run an input-guardrail batch concurrently.
    pub(crate) async fn run_input_guardrails(
        guardrails: &[InputGuardrail],
        ctx: &RunContext,
        agent: &Arc<Agent>,
        input: &RunInput,
    ) -> Result<Vec<InputGuardrailResult>> {
        if guardrails.is_empty() {
            return Ok(Vec::new());
        }
        let settled = join_all(
            guardrails
                .iter()
                .map(|guardrail| guardrail.run(ctx, agent, input)),
        )
        .await;
        Self::collate_input_guardrails(guardrails, settled)
    }

    /// Collate settled input-guardrail outcomes, in issuance order.
    ///
    /// Check failures are logged and excluded. Among tripped results, the
    /// lowest original index wins.
    pub(crate) fn collate_input_guardrails(
        guardrails: &[InputGuardrail],
        settled: Vec<Result<InputGuardrailResult>>,
    ) -> Result<Vec<InputGuardrailResult>> {
        let mut results = Vec::with_capacity(settled.len());
        let mut tripped: Option<InputGuardrailResult> = None;
        for (guardrail, outcome) in guardrails.iter().zip(settled) {
            match outcome {
                Ok(result) if result.is_triggered() => {
                    if tripped.is_none() {
                        tripped = Some(result);
                    }
                }
                Ok(result) => results.push(result),
                Err(e) => {
                    warn!(
                        guardrail = %guardrail.name(),
                        error = %e,
                        "Input guardrail check failed, excluding its result"
                    );
                }
            }
        }
        match tripped {
            Some(result) => {
                warn!(guardrail = %result.guardrail_name, "Input guardrail tripwire triggered");
                Err(Error::InputGuardrailTriggered(result))
            }
            None => Ok(results),
        }
    }

    /// Run an output-guardrail batch concurrently.
    pub(crate) async fn run_output_guardrails(
        guardrails: &[OutputGuardrail],
        ctx: &RunContext,
        agent: &Arc<Agent>,
        output: &Value,
    ) -> Result<Vec<OutputGuardrailResult>> {
        if guardrails.is_empty() {
            return Ok(Vec::new());
        }
        let settled = join_all(
            guardrails
                .iter()
                .map(|guardrail| guardrail.run(ctx, agent, output)),
        )
        .await;

        let mut results = Vec::with_capacity(settled.len());
        let mut tripped: Option<OutputGuardrailResult> = None;
        for (guardrail, outcome) in guardrails.iter().zip(settled) {
            match outcome {
                Ok(result) if result.is_triggered() => {
                    if tripped.is_none() {
                        tripped = Some(result);
                    }
                }
                Ok(result) => results.push(result),
                Err(e) => {
                    warn!(
                        guardrail = %guardrail.name(),
                        error = %e,
                        "Output guardrail check failed, excluding its result"
                    );
                }
            }
        }
        match tripped {
            Some(result) => {
                warn!(guardrail = %result.guardrail_name, "Output guardrail tripwire triggered");
                Err(Error::OutputGuardrailTriggered(result))
            }
            None => Ok(results),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::guardrail::{GuardrailOutput, InputGuardrailCheck};
    use async_trait::async_trait;

    mod settings {
        use super::*;

        #[test]
        fn run_overrides_win_field_wise() {
            let agent = Agent::new("a").model_settings(ModelSettings {
                temperature: Some(0.1),
                max_tokens: Some(256),
                ..Default::default()
            });
            let config = RunConfig::new().with_model_settings(ModelSettings {
                temperature: Some(0.9),
                ..Default::default()
            });

            let merged = Runner::merged_settings(&agent, &config, false);
            assert_eq!(merged.temperature, Some(0.9));
            assert_eq!(merged.max_tokens, Some(256));
        }

        #[test]
        fn forced_choice_resets_to_auto() {
            let agent = Agent::new("a").model_settings(ModelSettings {
                tool_choice: Some(ToolChoice::Tool("get_weather".into())),
                ..Default::default()
            });
            let config = RunConfig::new();

            let merged = Runner::merged_settings(&agent, &config, true);
            assert_eq!(merged.tool_choice, Some(ToolChoice::Auto));
        }
    }

    mod guardrail_collation {
        use super::*;

        struct Pass;

        #[async_trait]
        impl InputGuardrailCheck for Pass {
            async fn check(
                &self,
                _ctx: &RunContext,
                _agent: &Agent,
                _input: &RunInput,
            ) -> Result<GuardrailOutput> {
                Ok(GuardrailOutput::pass())
            }
        }

        fn guardrails(names: &[&str]) -> Vec<InputGuardrail> {
            names
                .iter()
                .map(|name| InputGuardrail::new(*name, Pass))
                .collect()
        }

        fn tripped(name: &str) -> InputGuardrailResult {
            InputGuardrailResult {
                guardrail_name: name.into(),
                output: GuardrailOutput::tripwire("bad"),
            }
        }

        fn passed(name: &str) -> InputGuardrailResult {
            InputGuardrailResult {
                guardrail_name: name.into(),
                output: GuardrailOutput::pass(),
            }
        }

        #[test]
        fn lowest_index_trip_wins() {
            let guardrails = guardrails(&["g0", "g1", "g2"]);
            let settled = vec![Ok(passed("g0")), Ok(tripped("g1")), Ok(tripped("g2"))];

            let err = Runner::collate_input_guardrails(&guardrails, settled).unwrap_err();
            match err {
                Error::InputGuardrailTriggered(result) => {
                    assert_eq!(result.guardrail_name, "g1");
                }
                other => panic!("expected tripwire error, got {other:?}"),
            }
        }

        #[test]
        fn check_failures_are_excluded_not_fatal() {
            let guardrails = guardrails(&["g0", "g1", "g2"]);
            let settled = vec![
                Ok(passed("g0")),
                Err(Error::user("guardrail blew up")),
                Ok(passed("g2")),
            ];

            let results = Runner::collate_input_guardrails(&guardrails, settled).unwrap();
            assert_eq!(results.len(), 2);
            assert_eq!(results[0].guardrail_name, "g0");
            assert_eq!(results[1].guardrail_name, "g2");
        }
    }
}
