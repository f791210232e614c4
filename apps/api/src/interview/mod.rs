// Interview flow: start an interview, process candidate turns, transcribe
// recorded answers, and hand out the synthesized audio exactly once.
// All provider calls go through the SpeechTextProvider in AppState.

pub mod flow;
pub mod handlers;
pub mod prompts;
