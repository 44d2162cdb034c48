use serde_json::Value;

use haven_domain::{report, sentiment::SentimentAggregate};

const SYSTEM_PROMPT: &str = "\
You are a personal mental-health support companion for young people.

Purpose:
- Offer a safe, empathetic, non-judgmental space to talk about feelings.
- Support emotional well-being through conversation, reflection, and gentle guidance.
- You are a supportive companion, not a medical professional.

Rules:
- Never diagnose mental illness or give medical or harmful advice.
- Never judge, shame, or dismiss the user.
- Use simple, warm, human language in short, calm sentences suitable for voice output.
- If serious distress appears, gently encourage reaching out to a trusted person.

Track the user's emotional state through the session. For every reply, rate the user's latest
message from 0 (very low mood) to 1 (very positive mood) and name one emotion.";

const REPORT_SYSTEM_PROMPT: &str = "\
You are a conversational sentiment analysis and reporting assistant. You receive a complete,
timestamped support session and produce a clear, empathetic, structured report suitable for a
dashboard. Return only a JSON object with exactly the requested fields.";

const EMOTIONS: [&str; 6] = ["sad", "anxious", "stressed", "neutral", "hopeful", "happy"];

/// System framing for a chat turn, with retrieved exchanges appended as reference material.
pub(crate) fn turn_system(context: &str) -> String {
	if context.trim().is_empty() {
		return SYSTEM_PROMPT.to_string();
	}

	format!(
		"{SYSTEM_PROMPT}\n\nReference exchanges from similar conversations. Use them as guidance, \
		 never quote them verbatim:\n\n{context}"
	)
}

pub(crate) fn turn_prompt(mood_description: &str, elapsed_minutes: i64, message: &str) -> String {
	let mood = if mood_description.trim().is_empty() { "Not specified" } else { mood_description };

	format!(
		"User details:\n\
		 - Current mood description: \"{mood}\"\n\
		 - Session duration elapsed: {elapsed_minutes} minutes\n\n\
		 Respond to the user's latest message: \"{message}\"\n\n\
		 Return JSON only, with fields \"response\" (your reply), \"sentimentScore\" (0-1 for \
		 the user's message) and \"emotion\" (one of: {}).",
		EMOTIONS.join(", ")
	)
}

pub(crate) fn turn_schema() -> Value {
	serde_json::json!({
		"type": "object",
		"properties": {
			"response": { "type": "string" },
			"sentimentScore": { "type": "number", "minimum": 0, "maximum": 1 },
			"emotion": { "type": "string", "enum": EMOTIONS }
		},
		"required": ["response", "sentimentScore", "emotion"]
	})
}

pub(crate) fn report_system() -> &'static str {
	REPORT_SYSTEM_PROMPT
}

pub(crate) fn report_prompt(
	mood_description: &str,
	transcript: &str,
	aggregate: &SentimentAggregate,
) -> String {
	let template = serde_json::to_string_pretty(&report::report_template())
		.unwrap_or_else(|_| report::report_template().to_string());
	let hints = aggregate
		.timeline()
		.into_iter()
		.map(|point| format!("- {:?}: {} ({:+.2})", point.phase, point.sentiment, point.score))
		.collect::<Vec<_>>()
		.join("\n");

	format!(
		"Analyze this completed support session.\n\n\
		 Mood described at start: \"{mood}\"\n\n\
		 CONVERSATION DATA:\n{transcript}\n\n\
		 Measured sentiment by phase (-1 negative to 1 positive), {turns} scored turns, \
		 computed trend {trend}:\n{hints}\n\n\
		 Goals: describe how the user's feelings changed from start to end, identify key \
		 emotional turning points, give a final assessment and personalized tips, and fill \
		 the sentiment timeline with scores between -1 and 1.\n\n\
		 Return ONLY a JSON object with this exact structure, without markdown:\n{template}",
		mood = if mood_description.trim().is_empty() { "Not specified" } else { mood_description },
		turns = aggregate.scored_turns,
		trend = aggregate.trend,
	)
}

pub(crate) fn mood_prompt(mood_text: &str) -> String {
	format!(
		"User mood: \"{mood_text}\".\n\n\
		 1. Rate the sentiment of this mood text:\n\
		 \t1 = very negative (despair, deep sadness, anger)\n\
		 \t2 = negative (sad, anxious, frustrated)\n\
		 \t3 = neutral (okay, bored, indifferent)\n\
		 \t4 = positive (happy, hopeful, content)\n\
		 \t5 = very positive (ecstatic, grateful, excited)\n\
		 2. Pick a famous, real quote that fits this mood. For a negative mood choose something \
		 comforting or hopeful; for a positive mood something uplifting. Do not invent quotes.\n\n\
		 Return JSON with \"quote\", \"author\", \"sentimentScore\" (1-5) and \
		 \"sentimentConfidence\" (0-1)."
	)
}

