use ratatui::layout::Rect;
use tokio::task::JoinHandle;
use tracing::{error, info};
use cortex_core::{ChatError, Conversation, TurnExecutor};

pub const QUICK_ACTIONS: [&str; 3] = [
    "Write a React hook",
    "Explain async/await",
    "Plan my day",
];

type TurnTask = JoinHandle<Result<Option<String>, ChatError>>;

pub struct App {
    pub should_quit: bool,

    // Conversation
    pub conversation: Conversation,
    pub executor: TurnExecutor,
    pub turn_task: Option<TurnTask>,

    // Input box
    pub input: String,
    pub cursor: usize, // char index into input

    // Chat scrolling
    pub chat_scroll: u16,
    pub max_scroll: u16,
    pub follow_tail: bool,
    pub chat_height: u16, // inner height, updated during render
    pub chat_width: u16,  // inner width, updated during render
    pub chat_area: Option<Rect>,

    pub animation_frame: u8, // 0-2 for ellipsis animation

    // Shown in the header
    pub model: String,
    pub has_api_key: bool,
}

impl App {
    pub fn new(executor: TurnExecutor, model: &str, has_api_key: bool) -> Self {
        Self {
            should_quit: false,

            conversation: Conversation::new(),
            executor,
            turn_task: None,

            input: String::new(),
            cursor: 0,

            chat_scroll: 0,
            max_scroll: 0,
            follow_tail: true,
            chat_height: 0,
            chat_width: 0,
            chat_area: None,

            animation_frame: 0,

            model: model.to_string(),
            has_api_key,
        }
    }

    pub fn is_busy(&self) -> bool {
        self.conversation.is_pending()
    }

    /// Submit the input box as a new turn. Ignored when the input is blank
    /// or a turn is already in flight.
    pub fn submit(&mut self) {
        let Some(turn) = TurnExecutor::begin(&mut self.conversation, &self.input) else {
            return;
        };

        info!(chars = turn.message.chars().count(), "turn started");
        self.input.clear();
        self.cursor = 0;
        self.follow_tail = true;

        let service = self.executor.service();
        self.turn_task = Some(tokio::spawn(async move {
            service.send_turn(&turn.message, &turn.history).await
        }));
    }

    /// Settle the in-flight turn if its task has finished.
    pub async fn poll_turn(&mut self) {
        let finished = self
            .turn_task
            .as_ref()
            .map(|task| task.is_finished())
            .unwrap_or(false);
        if !finished {
            return;
        }

        if let Some(task) = self.turn_task.take() {
            let result = match task.await {
                Ok(result) => result,
                Err(err) => {
                    error!(error = %err, "turn task did not complete");
                    Err(ChatError::Internal(err.to_string()))
                }
            };
            let outcome = TurnExecutor::settle(&mut self.conversation, result);
            info!(?outcome, "turn settled");
            self.follow_tail = true;
        }
    }

    /// Start over with a fresh greeting. Not allowed mid-turn, since the
    /// in-flight reply would land in the new conversation.
    pub fn clear_chat(&mut self) {
        if self.is_busy() {
            return;
        }
        self.conversation.reset();
        self.chat_scroll = 0;
        self.follow_tail = true;
        info!("conversation cleared");
    }

    /// Replace the input with a canned prompt
    pub fn apply_quick_action(&mut self, index: usize) {
        if self.is_busy() {
            return;
        }
        if let Some(action) = QUICK_ACTIONS.get(index) {
            self.input = action.to_string();
            self.cursor = self.input.chars().count();
        }
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.is_busy() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    /// Recompute scroll bounds from the rendered height of the chat.
    pub fn update_scroll(&mut self, total_lines: u16) {
        self.max_scroll = total_lines.saturating_sub(self.chat_height);
        if self.follow_tail || self.chat_scroll > self.max_scroll {
            self.chat_scroll = self.max_scroll;
        }
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.chat_scroll = self.chat_scroll.saturating_sub(lines);
        self.follow_tail = self.chat_scroll >= self.max_scroll;
    }

    pub fn scroll_down(&mut self, lines: u16) {
        self.chat_scroll = self.chat_scroll.saturating_add(lines).min(self.max_scroll);
        self.follow_tail = self.chat_scroll >= self.max_scroll;
    }

    pub fn page_size(&self) -> u16 {
        (self.chat_height / 2).max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use cortex_core::{ChatRole, ChatService, TranscriptEntry};
    use cortex_core::executor::ERROR_REPLY;
    use std::sync::Arc;
    use std::time::Duration;

    struct EchoService;

    #[async_trait]
    impl ChatService for EchoService {
        async fn send_turn(
            &self,
            message: &str,
            _history: &[TranscriptEntry],
        ) -> Result<Option<String>, ChatError> {
            Ok(Some(format!("echo: {}", message)))
        }
    }

    struct BrokenService;

    #[async_trait]
    impl ChatService for BrokenService {
        async fn send_turn(
            &self,
            _message: &str,
            _history: &[TranscriptEntry],
        ) -> Result<Option<String>, ChatError> {
            Err(ChatError::Transport("network unreachable".to_string()))
        }
    }

    struct PanickingService;

    #[async_trait]
    impl ChatService for PanickingService {
        async fn send_turn(
            &self,
            _message: &str,
            _history: &[TranscriptEntry],
        ) -> Result<Option<String>, ChatError> {
            panic!("service bug");
        }
    }

    fn app_with(service: Arc<dyn ChatService>) -> App {
        App::new(TurnExecutor::new(service), "test-model", true)
    }

    async fn settle(app: &mut App) {
        for _ in 0..200 {
            app.poll_turn().await;
            if !app.is_busy() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("turn never settled");
    }

    #[tokio::test]
    async fn test_submit_then_poll_appends_reply() {
        let mut app = app_with(Arc::new(EchoService));
        app.input = "hello".to_string();
        app.cursor = 5;

        app.submit();
        assert!(app.is_busy());
        assert!(app.input.is_empty());
        assert_eq!(app.cursor, 0);
        assert_eq!(app.conversation.len(), 2);

        settle(&mut app).await;
        assert_eq!(app.conversation.len(), 3);
        let last = app.conversation.last().unwrap();
        assert_eq!(last.role, ChatRole::Assistant);
        assert_eq!(last.content, "echo: hello");
        assert!(app.turn_task.is_none());
    }

    #[tokio::test]
    async fn test_blank_input_is_not_submitted() {
        let mut app = app_with(Arc::new(EchoService));
        app.input = "   ".to_string();

        app.submit();
        assert!(!app.is_busy());
        assert!(app.turn_task.is_none());
        assert_eq!(app.input, "   ");
        assert_eq!(app.conversation.len(), 1);
    }

    #[tokio::test]
    async fn test_second_submit_while_busy_is_dropped() {
        let mut app = app_with(Arc::new(EchoService));
        app.input = "first".to_string();
        app.submit();

        app.input = "second".to_string();
        app.submit();
        assert_eq!(app.input, "second");
        assert_eq!(app.conversation.len(), 2);

        settle(&mut app).await;
        assert_eq!(app.conversation.len(), 3);
    }

    #[tokio::test]
    async fn test_service_failure_shows_error_reply() {
        let mut app = app_with(Arc::new(BrokenService));
        app.input = "hello".to_string();
        app.submit();

        settle(&mut app).await;
        assert_eq!(app.conversation.len(), 3);
        assert_eq!(app.conversation.last().unwrap().content, ERROR_REPLY);
    }

    #[tokio::test]
    async fn test_panicking_task_still_settles() {
        let mut app = app_with(Arc::new(PanickingService));
        app.input = "hello".to_string();
        app.submit();

        settle(&mut app).await;
        assert_eq!(app.conversation.last().unwrap().content, ERROR_REPLY);
        assert!(!app.is_busy());
    }

    #[tokio::test]
    async fn test_clear_is_ignored_mid_turn() {
        let mut app = app_with(Arc::new(EchoService));
        app.input = "hello".to_string();
        app.submit();

        app.clear_chat();
        assert_eq!(app.conversation.len(), 2);

        settle(&mut app).await;
        app.clear_chat();
        assert_eq!(app.conversation.len(), 1);
    }

    #[test]
    fn test_quick_action_fills_input() {
        let mut app = app_with(Arc::new(EchoService));
        app.apply_quick_action(1);
        assert_eq!(app.input, "Explain async/await");
        assert_eq!(app.cursor, "Explain async/await".len());

        app.apply_quick_action(7);
        assert_eq!(app.input, "Explain async/await");
    }

    #[test]
    fn test_scrolling_up_stops_following_tail() {
        let mut app = app_with(Arc::new(EchoService));
        app.chat_height = 10;
        app.update_scroll(30);
        assert_eq!(app.chat_scroll, 20);

        app.scroll_up(5);
        assert_eq!(app.chat_scroll, 15);
        assert!(!app.follow_tail);

        app.update_scroll(40);
        assert_eq!(app.chat_scroll, 15);

        app.scroll_down(100);
        assert_eq!(app.chat_scroll, 30);
        assert!(app.follow_tail);
    }
}
