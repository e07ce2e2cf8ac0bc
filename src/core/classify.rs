//! Transcript-to-intent classification.
//!
//! A transcript is classified by an ordered rule list: empty input, wrong
//! number, not available, sentence-level decision keywords (last decision
//! wins), voicemail markers, sentiment, then a busy/voicemail default.
//! Substring matching is an approximation of intent and will miscode some
//! genuine conversations; last-decision-wins ordering limits the damage by
//! letting a patient's final statement override both earlier small talk and
//! the agent's own scripted prompts. The upside is that the classifier is a
//! pure function over fixed pattern tables that tests can pin down exactly.

use std::sync::OnceLock;

use regex::Regex;

use crate::core::campaign::Outcome;

const WRONG_NUMBER_PATTERNS: &[&str] = &[
    "wrong number",
    "no one by that name",
    "nobody by that name",
    "you have the wrong",
    "you must have the wrong",
    "don't know who that is",
    "never heard of",
    "incorrect number",
];

const NOT_AVAILABLE_PATTERNS: &[&str] = &[
    "not here right now",
    "isn't here right now",
    "he's not here",
    "she's not here",
    "they're not here",
    "can't talk right now",
    "can't come to the phone",
    "call back later",
    "call me back later",
    "try again later",
    "bad time",
    "in a meeting",
    "middle of something",
    "busy at the moment",
];

const CONFIRM_PATTERNS: &[&str] = &[
    "i'll be there",
    "i will be there",
    "will be there",
    "i'll see you",
    "see you then",
    "see you there",
    "i confirm",
    "confirm",
    "sounds good",
    "that works",
    "works for me",
    "looking forward",
    "i can make it",
    "i'll make it",
    "count me in",
    "i'll attend",
    "will attend",
    "able to attend",
    "plan on being there",
];

const CONFIRM_WORDS: &[&str] = &[
    "yes",
    "yeah",
    "yep",
    "yup",
    "absolutely",
    "definitely",
    "certainly",
];

const RESCHEDULE_PATTERNS: &[&str] = &[
    "reschedule",
    "re-schedule",
    "different time",
    "different day",
    "another time",
    "another day",
    "change the appointment",
    "change my appointment",
    "change appointment",
    "change the time",
    "move the appointment",
    "move my appointment",
    "move it to",
    "push it back",
    "can we schedule",
    "schedule it for",
    "some other time",
];

const CANCEL_PATTERNS: &[&str] = &[
    "cancel",
    "call it off",
    "can't make it",
    "cannot make it",
    "can not make it",
    "won't make it",
    "won't be there",
    "will not be there",
    "can't come",
    "cannot come",
    "can't be there",
    "unable to make",
    "unable to come",
    "unable to attend",
    "not going to make it",
    "no longer need",
];

const NEGATION_WORDS: &[&str] = &[
    "no", "not", "never", "can't", "cannot", "won't", "wouldn't", "shouldn't", "don't", "doesn't",
    "isn't", "unable",
];

const VOICEMAIL_PATTERNS: &[&str] = &[
    "leave a message",
    "leave your message",
    "leave me a message",
    "after the beep",
    "after the tone",
    "at the tone",
    "beep",
    "voicemail",
    "voice mail",
    "mailbox",
    "answering machine",
    "messaging system",
    "automated voice",
    "not in service",
    "disconnected",
    "no answer",
];

const CONVERSATION_WORDS: &[&str] = &[
    "hello", "hi", "hey", "thanks", "thank", "who", "what", "when", "where", "why", "how",
    "speaking",
];

const POSITIVE_WORDS: &[&str] = &[
    "great",
    "good",
    "thanks",
    "thank",
    "sure",
    "wonderful",
    "perfect",
    "happy",
    "glad",
    "appreciate",
    "lovely",
    "nice",
    "fine",
];

const NEGATIVE_WORDS: &[&str] = &[
    "no",
    "not",
    "bad",
    "busy",
    "sorry",
    "unfortunately",
    "problem",
    "wrong",
    "never",
    "stop",
    "don't",
];

/// Which rule of the ordered list produced the outcome. Lets callers log the
/// fallthrough default (ambiguity) without re-deriving it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    EmptyTranscript,
    WrongNumber,
    NotAvailable,
    Decision,
    VoicemailMarker,
    Sentiment,
    Default,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DecisionFamily {
    Confirm,
    Reschedule,
    Cancel,
}

/// Classify a call transcript into an outcome. Pure and deterministic.
#[allow(dead_code)]
pub fn classify(transcript: &str) -> Outcome {
    classify_detailed(transcript).0
}

/// Like [classify], but also reports which rule decided.
pub fn classify_detailed(transcript: &str) -> (Outcome, Rule) {
    if transcript.trim().is_empty() {
        return (Outcome::BusyVoicemail, Rule::EmptyTranscript);
    }
    let text = transcript.to_lowercase();

    if contains_any(&text, WRONG_NUMBER_PATTERNS) {
        return (Outcome::WrongNumber, Rule::WrongNumber);
    }
    if contains_any(&text, NOT_AVAILABLE_PATTERNS) {
        return (Outcome::NotAvailable, Rule::NotAvailable);
    }

    if let Some(family) = last_decision(&text) {
        let outcome = match family {
            DecisionFamily::Confirm => Outcome::Confirmed,
            DecisionFamily::Reschedule => Outcome::Rescheduled,
            DecisionFamily::Cancel => Outcome::Cancelled,
        };
        return (outcome, Rule::Decision);
    }

    if contains_any(&text, VOICEMAIL_PATTERNS) {
        return (Outcome::BusyVoicemail, Rule::VoicemailMarker);
    }

    if looks_conversational(&text) {
        let (positive, negative) = sentiment_counts(&text);
        let outcome = if positive > negative {
            Outcome::Confirmed
        } else {
            Outcome::BusyVoicemail
        };
        return (outcome, Rule::Sentiment);
    }

    (Outcome::BusyVoicemail, Rule::Default)
}

/// Scan every sentence for decision keywords and return the family of the
/// last match: later sentences override earlier ones, and within a sentence
/// a later match position overrides an earlier one. A confirmation match is
/// dropped when its sentence also contains a negation word.
fn last_decision(text: &str) -> Option<DecisionFamily> {
    let mut winner: Option<(usize, usize, DecisionFamily)> = None;

    for (index, sentence) in sentences(text).enumerate() {
        let confirm_pos = match (
            last_match(sentence, CONFIRM_PATTERNS),
            last_word_match(sentence, CONFIRM_WORDS),
        ) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        };

        let mut found: Vec<(usize, DecisionFamily)> = Vec::new();
        if let Some(pos) = confirm_pos
            && !has_any_word(sentence, NEGATION_WORDS)
        {
            found.push((pos, DecisionFamily::Confirm));
        }
        if let Some(pos) = last_match(sentence, RESCHEDULE_PATTERNS) {
            found.push((pos, DecisionFamily::Reschedule));
        }
        if let Some(pos) = last_match(sentence, CANCEL_PATTERNS) {
            found.push((pos, DecisionFamily::Cancel));
        }

        for (pos, family) in found {
            match winner {
                Some((wi, wp, _)) if (index, pos) < (wi, wp) => {}
                _ => winner = Some((index, pos, family)),
            }
        }
    }

    winner.map(|(_, _, family)| family)
}

fn sentences(text: &str) -> impl Iterator<Item = &str> {
    static SPLITTER: OnceLock<Regex> = OnceLock::new();
    let splitter = SPLITTER.get_or_init(|| Regex::new(r"[.!?]+").unwrap());
    splitter.split(text).map(str::trim).filter(|s| !s.is_empty())
}

fn word_pattern() -> &'static Regex {
    static WORDS: OnceLock<Regex> = OnceLock::new();
    WORDS.get_or_init(|| Regex::new(r"[a-z0-9']+").unwrap())
}

fn contains_any(text: &str, patterns: &[&str]) -> bool {
    patterns.iter().any(|p| text.contains(p))
}

/// Byte offset of the rightmost occurrence of any pattern, if one matches.
fn last_match(text: &str, patterns: &[&str]) -> Option<usize> {
    patterns.iter().filter_map(|p| text.rfind(p)).max()
}

/// Byte offset of the rightmost whole-word match. Word-level matching avoids
/// substring false positives like "yes" inside "yesterday".
fn last_word_match(text: &str, list: &[&str]) -> Option<usize> {
    word_pattern()
        .find_iter(text)
        .filter(|m| list.contains(&m.as_str()))
        .map(|m| m.start())
        .last()
}

fn has_any_word(text: &str, list: &[&str]) -> bool {
    word_pattern()
        .find_iter(text)
        .any(|m| list.contains(&m.as_str()))
}

fn looks_conversational(text: &str) -> bool {
    let word_count = word_pattern().find_iter(text).count();
    word_count >= 8 && (has_any_word(text, CONVERSATION_WORDS) || text.contains('?'))
}

fn sentiment_counts(text: &str) -> (usize, usize) {
    let mut positive = 0;
    let mut negative = 0;
    for m in word_pattern().find_iter(text) {
        let word = m.as_str();
        if POSITIVE_WORDS.contains(&word) {
            positive += 1;
        }
        if NEGATIVE_WORDS.contains(&word) {
            negative += 1;
        }
    }
    (positive, negative)
}
