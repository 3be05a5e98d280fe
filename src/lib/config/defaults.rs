pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_MODEL_ENDPOINT: &str = "https://api.openai.com/v1";
pub const DEFAULT_API_KEY_ENV: &str = "OPENAI_API_KEY";
pub const ENDPOINT_ENV: &str = "OPENAI_API_BASE";
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_MAX_TOKENS: u32 = 2048;
pub const DEFAULT_MODEL_TIMEOUT_SECS: u64 = 60;

pub const DEFAULT_MAX_TOOL_USES: u32 = 1;
pub const DEFAULT_HISTORY_WINDOW: usize = 10;
pub const DEFAULT_MAX_DECISIONS: usize = 16;
pub const DEFAULT_PROMPT_TEMPLATE_PATH: &str = "prompts/system_prompt.txt";
pub const DEFAULT_TOOL_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 30;
