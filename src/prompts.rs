//! Fixed prompt text and user-facing notices.
//!
//! The system instruction is the only thing keeping the model on Lua, so it
//! is sent byte-for-byte on every request.

/// Role prompt attached to every generation request.
pub const SYSTEM_INSTRUCTION: &str = "You are an expert Lua software engineer. \
Your only task is to write clean, concise, and functional **Lua code** \
based on the user's request. **You must only output the code**, \
wrapping it in the appropriate Markdown code block (specifically: ```lua ... ```). \
Do not write code in any other language or include any explanatory text outside the code block.";

pub const USER_REQUEST_PREFIX: &str = "User Request: ";

pub const EMPTY_RESPONSE_NOTICE: &str =
    "The AI generated an empty response. Please try a different prompt.";

pub const API_ERROR_NOTICE: &str =
    "❌ **API Error:** A problem occurred during code generation. Check the terminal for details.";

pub const HELP_FOOTER: &str = "Type !help <command> for more info on a command.";

/// Text of the single user-role part.
pub fn user_request(prompt: &str) -> String {
    format!("{}{}", USER_REQUEST_PREFIX, prompt)
}

/// Reply body for a successful generation. The model output is passed through
/// untouched.
pub fn generated_reply(prompt: &str, text: &str) -> String {
    format!("**Generated Lua Code for:** `{}`\n\n{}", prompt, text)
}
