//! Console chat loop
//!
//! Keeps the conversation history, forwards it to a [`ChatBackend`] and, when a
//! [`Kernel`] is attached, resolves function calls the model makes.

use std::sync::Arc;

use anyhow::{Context, Result};
use serde_json::{json, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::llm::types::{FunctionDeclaration, FunctionResponse};
use crate::llm::{ChatBackend, Content, GenerateContentRequest, GenerateContentResponse, Role};
use crate::tools::Kernel;

pub const USER_PROMPT: &str = "User > ";
pub const ASSISTANT_PREFIX: &str = "Assistant > ";
pub const EXIT_COMMAND: &str = "exit";

/// Who sent a message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    User,
    Assistant,
}

impl From<ChatRole> for Role {
    fn from(role: ChatRole) -> Self {
        match role {
            ChatRole::User => Role::User,
            ChatRole::Assistant => Role::Model,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub text: String,
}

/// Append-only log of the conversation
#[derive(Debug, Clone, Default)]
pub struct ChatHistory {
    messages: Vec<ChatMessage>,
}

impl ChatHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_user_message(&mut self, text: impl Into<String>) {
        self.push(ChatRole::User, text.into());
    }

    pub fn add_assistant_message(&mut self, text: impl Into<String>) {
        self.push(ChatRole::Assistant, text.into());
    }

    fn push(&mut self, role: ChatRole, text: String) {
        self.messages.push(ChatMessage { role, text });
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Convert to the backend's role-tagged format, one text part per message
    pub fn to_contents(&self) -> Vec<Content> {
        self.messages
            .iter()
            .map(|message| Content {
                role: message.role.into(),
                ..Content::user(message.text.as_str())
            })
            .collect()
    }
}

/// Session behavior switches
#[derive(Debug, Clone, Copy)]
pub struct ChatOptions {
    /// Send kernel functions to the model and execute the calls it makes
    pub function_calling: bool,
    /// Follow-up requests allowed per user message while resolving calls
    pub max_function_rounds: u32,
}

impl Default for ChatOptions {
    fn default() -> Self {
        Self {
            function_calling: true,
            max_function_rounds: 5,
        }
    }
}

/// One conversation with a backend
pub struct ChatSession {
    backend: Arc<dyn ChatBackend>,
    history: ChatHistory,
    kernel: Kernel,
    options: ChatOptions,
}

impl ChatSession {
    pub fn new(backend: Arc<dyn ChatBackend>) -> Self {
        Self {
            backend,
            history: ChatHistory::new(),
            kernel: Kernel::new(),
            options: ChatOptions::default(),
        }
    }

    /// Attach plugins the model may call
    pub fn with_kernel(mut self, kernel: Kernel) -> Self {
        self.kernel = kernel;
        self
    }

    pub fn with_options(mut self, options: ChatOptions) -> Self {
        self.options = options;
        self
    }

    pub fn history(&self) -> &ChatHistory {
        &self.history
    }

    pub fn kernel(&self) -> &Kernel {
        &self.kernel
    }

    /// Send a user message and return the assistant's reply.
    ///
    /// The user message is recorded before the backend is called and stays in
    /// history if the call fails. The reply is recorded on success.
    pub async fn send(&mut self, message: impl Into<String>) -> Result<String> {
        self.history.add_user_message(message);

        let declarations = self.declarations();
        let mut contents = self.history.to_contents();
        let mut rounds = 0;

        let reply = loop {
            let request =
                GenerateContentRequest::new(contents.clone()).with_functions(declarations.clone());
            let response = self.dispatch(request).await?;

            let content = match response.first_content() {
                Some(content) => content.clone(),
                None => anyhow::bail!(
                    "Backend returned no candidates (reason: {})",
                    response.block_reason().unwrap_or("unknown")
                ),
            };

            let calls = content.function_calls();
            if calls.is_empty() || declarations.is_empty() {
                break content.text();
            }

            if rounds == self.options.max_function_rounds {
                anyhow::bail!(
                    "Function calling did not finish within {} rounds",
                    self.options.max_function_rounds
                );
            }
            rounds += 1;

            let responses = calls
                .into_iter()
                .map(|call| FunctionResponse {
                    name: call.name.clone(),
                    response: self.call_function(&call.name, call.args.clone()),
                })
                .collect();

            contents.push(content);
            contents.push(Content::function_responses(responses));
        };

        self.history.add_assistant_message(reply.as_str());
        Ok(reply)
    }

    fn declarations(&self) -> Vec<FunctionDeclaration> {
        if !self.options.function_calling {
            return Vec::new();
        }
        self.kernel
            .function_specs()
            .into_iter()
            .map(FunctionDeclaration::from)
            .collect()
    }

    /// Run the backend call on its own task and wait for it
    async fn dispatch(&self, request: GenerateContentRequest) -> Result<GenerateContentResponse> {
        let backend = Arc::clone(&self.backend);
        tokio::spawn(async move { backend.generate(request).await })
            .await
            .context("Backend task failed")?
    }

    fn call_function(&mut self, name: &str, args: Value) -> Value {
        match self.kernel.invoke(name, args) {
            Ok(result) => json!({ "result": result }),
            Err(e) => {
                tracing::warn!("Function {} failed: {}", name, e);
                json!({ "error": e.to_string() })
            }
        }
    }
}

/// Whether a line of input ends the chat
pub fn is_exit(input: &str) -> bool {
    input.to_lowercase() == EXIT_COMMAND
}

/// Drive `session` from `input` until the user types `exit` or input ends.
///
/// Backend errors end the loop and are returned to the caller.
pub async fn run_chat_loop<R, W>(
    session: &mut ChatSession,
    input: R,
    mut output: W,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = input.lines();

    loop {
        output.write_all(USER_PROMPT.as_bytes()).await?;
        output.flush().await?;

        let Some(line) = lines.next_line().await.context("Failed to read input")? else {
            tracing::info!("Input closed, ending chat");
            break;
        };

        if is_exit(&line) {
            tracing::info!("Exit requested after {} messages", session.history().len());
            break;
        }
        if line.trim().is_empty() {
            continue;
        }

        let reply = session.send(line).await?;
        output
            .write_all(format!("{}{}\n", ASSISTANT_PREFIX, reply).as_bytes())
            .await?;
    }

    output.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lights::LightRegistry;
    use crate::llm::types::Part;
    use crate::tools::{LightsPlugin, SwitchPlugin};
    use pretty_assertions::assert_eq;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Backend replaying canned responses and recording requests
    #[derive(Default)]
    struct ScriptedBackend {
        responses: Mutex<VecDeque<Result<GenerateContentResponse>>>,
        requests: Mutex<Vec<GenerateContentRequest>>,
    }

    impl ScriptedBackend {
        fn replying(responses: Vec<Result<GenerateContentResponse>>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses.into()),
                requests: Mutex::default(),
            })
        }

        fn requests(&self) -> Vec<GenerateContentRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl ChatBackend for ScriptedBackend {
        async fn generate(
            &self,
            request: GenerateContentRequest,
        ) -> Result<GenerateContentResponse> {
            self.requests.lock().unwrap().push(request);
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(anyhow::anyhow!("no scripted response left")))
        }
    }

    fn reply(content: Content) -> Result<GenerateContentResponse> {
        let json = json!({ "candidates": [{ "content": content }] });
        Ok(serde_json::from_value(json).unwrap())
    }

    fn text(text: &str) -> Result<GenerateContentResponse> {
        reply(Content::model(text))
    }

    fn function_call(name: &str, args: Value) -> Result<GenerateContentResponse> {
        let json = json!({
            "candidates": [{
                "content": {
                    "role": "model",
                    "parts": [{ "functionCall": { "name": name, "args": args } }]
                }
            }]
        });
        Ok(serde_json::from_value(json).unwrap())
    }

    fn switch_kernel() -> Kernel {
        let mut kernel = Kernel::new();
        kernel.add_plugin(Box::new(SwitchPlugin::new())).unwrap();
        kernel
    }

    async fn run(session: &mut ChatSession, input: &str) -> (Result<()>, String) {
        let mut output = Vec::new();
        let result = run_chat_loop(session, input.as_bytes(), &mut output).await;
        (result, String::from_utf8(output).unwrap())
    }

    #[test]
    fn test_history_role_mapping() {
        let mut history = ChatHistory::new();
        history.add_user_message("hi");
        history.add_assistant_message("hello");

        assert_eq!(
            history.to_contents(),
            vec![Content::user("hi"), Content::model("hello")]
        );
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn test_is_exit() {
        assert!(is_exit("exit"));
        assert!(is_exit("EXIT"));
        assert!(is_exit("Exit"));
        assert!(!is_exit("exit please"));
        assert!(!is_exit(" exit"));
    }

    #[tokio::test]
    async fn test_send_records_both_turns() {
        let backend = ScriptedBackend::replying(vec![text("Hello!"), text("Still here.")]);
        let mut session = ChatSession::new(backend.clone());

        assert_eq!(session.send("Hi").await.unwrap(), "Hello!");
        assert_eq!(session.send("Are you there?").await.unwrap(), "Still here.");

        let requests = backend.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(
            requests[1].contents,
            vec![
                Content::user("Hi"),
                Content::model("Hello!"),
                Content::user("Are you there?"),
            ]
        );
        assert!(requests[1].tools.is_empty());
        assert_eq!(session.history().len(), 4);
    }

    #[tokio::test]
    async fn test_send_propagates_backend_error() {
        let backend = ScriptedBackend::replying(vec![Err(anyhow::anyhow!("quota exceeded"))]);
        let mut session = ChatSession::new(backend);

        let err = session.send("Hi").await.unwrap_err();
        assert!(err.to_string().contains("quota exceeded"));
        assert_eq!(
            session.history().messages(),
            &[ChatMessage {
                role: ChatRole::User,
                text: "Hi".to_string()
            }]
        );
    }

    #[tokio::test]
    async fn test_send_without_candidates_fails() {
        let blocked: GenerateContentResponse =
            serde_json::from_value(json!({"promptFeedback": {"blockReason": "SAFETY"}})).unwrap();
        let backend = ScriptedBackend::replying(vec![Ok(blocked)]);
        let mut session = ChatSession::new(backend);

        let err = session.send("Hi").await.unwrap_err();
        assert!(err.to_string().contains("SAFETY"));
    }

    #[tokio::test]
    async fn test_function_call_round_trip() {
        let backend = ScriptedBackend::replying(vec![
            function_call("Lights-turn_on", json!({})),
            text("Done, the lights are on."),
        ]);
        let mut session = ChatSession::new(backend.clone()).with_kernel(switch_kernel());

        let reply = session.send("Turn on the lights").await.unwrap();
        assert_eq!(reply, "Done, the lights are on.");

        let requests = backend.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].tools[0].function_declarations.len(), 2);

        let follow_up = &requests[1].contents;
        assert_eq!(follow_up.len(), 3);
        assert_eq!(follow_up[1].function_calls()[0].name, "Lights-turn_on");
        assert_eq!(
            follow_up[2],
            Content::function_responses(vec![FunctionResponse {
                name: "Lights-turn_on".to_string(),
                response: json!({"result": "Lights turned on."}),
            }])
        );

        // Function traffic is not kept in the history
        assert_eq!(session.history().len(), 2);
    }

    #[tokio::test]
    async fn test_function_call_mutates_registry() {
        let mut kernel = Kernel::new();
        kernel
            .add_plugin(Box::new(LightsPlugin::new(LightRegistry::demo())))
            .unwrap();
        let backend = ScriptedBackend::replying(vec![
            function_call("LightsPlugin-change_state", json!({"id": 2, "brightness": 5})),
            function_call("LightsPlugin-get_lights", json!({})),
            text("Porch light dimmed."),
        ]);
        let mut session = ChatSession::new(backend.clone()).with_kernel(kernel);

        session.send("Dim the porch light").await.unwrap();

        let requests = backend.requests();
        let lights = &requests[2].contents[4].parts[0]
            .function_response
            .as_ref()
            .unwrap()
            .response["result"];
        assert_eq!(lights[1]["brightness"], json!(5));
    }

    #[tokio::test]
    async fn test_function_error_reported_to_model() {
        let backend = ScriptedBackend::replying(vec![
            function_call("Lights-explode", json!({})),
            text("I can't do that."),
        ]);
        let mut session = ChatSession::new(backend.clone()).with_kernel(switch_kernel());

        assert_eq!(session.send("Explode").await.unwrap(), "I can't do that.");

        let requests = backend.requests();
        let response = &requests[1].contents[2].parts[0].function_response;
        assert!(response.as_ref().unwrap().response["error"]
            .as_str()
            .unwrap()
            .contains("explode"));
    }

    #[tokio::test]
    async fn test_function_round_limit() {
        let backend = ScriptedBackend::replying(vec![
            function_call("Lights-turn_on", json!({})),
            function_call("Lights-turn_on", json!({})),
        ]);
        let mut session = ChatSession::new(backend.clone())
            .with_kernel(switch_kernel())
            .with_options(ChatOptions {
                function_calling: true,
                max_function_rounds: 1,
            });

        let err = session.send("Turn on").await.unwrap_err();
        assert!(err.to_string().contains("1 rounds"));
        assert_eq!(backend.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_function_calling_disabled() {
        let backend = ScriptedBackend::replying(vec![reply(Content {
            role: Role::Model,
            parts: vec![Part::text("Okay.")],
        })]);
        let mut session = ChatSession::new(backend.clone())
            .with_kernel(switch_kernel())
            .with_options(ChatOptions {
                function_calling: false,
                ..ChatOptions::default()
            });

        assert_eq!(session.send("Lights on").await.unwrap(), "Okay.");
        assert!(backend.requests()[0].tools.is_empty());
    }

    #[tokio::test]
    async fn test_exit_first_makes_no_backend_call() {
        for exit in ["exit", "EXIT", "eXiT"] {
            let backend = ScriptedBackend::replying(vec![]);
            let mut session = ChatSession::new(backend.clone());

            let (result, output) = run(&mut session, &format!("{}\nhello\n", exit)).await;

            assert!(result.is_ok());
            assert_eq!(output, "User > ");
            assert!(backend.requests().is_empty());
            assert!(session.history().is_empty());
        }
    }

    #[tokio::test]
    async fn test_loop_prints_replies() {
        let backend = ScriptedBackend::replying(vec![text("Hi!"), text("Bye!")]);
        let mut session = ChatSession::new(backend.clone());

        let (result, output) = run(&mut session, "hello\n\ngoodbye\nExit\n").await;

        assert!(result.is_ok());
        assert_eq!(
            output,
            "User > Assistant > Hi!\nUser > User > Assistant > Bye!\nUser > "
        );
        assert_eq!(backend.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_loop_ends_at_end_of_input() {
        let backend = ScriptedBackend::replying(vec![text("Hi!")]);
        let mut session = ChatSession::new(backend);

        let (result, output) = run(&mut session, "hello").await;

        assert!(result.is_ok());
        assert_eq!(output, "User > Assistant > Hi!\nUser > ");
    }

    #[tokio::test]
    async fn test_loop_stops_on_backend_error() {
        let backend = ScriptedBackend::replying(vec![Err(anyhow::anyhow!("401 Unauthorized"))]);
        let mut session = ChatSession::new(backend.clone());

        let (result, output) = run(&mut session, "hello\nagain\n").await;

        assert!(result.unwrap_err().to_string().contains("401"));
        assert_eq!(output, "User > ");
        assert_eq!(backend.requests().len(), 1);
    }
}
