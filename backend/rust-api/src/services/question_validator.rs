use serde_json::Value;

use crate::metrics::QUESTIONS_DISCARDED_TOTAL;
use crate::models::question::{Question, OPTIONS_PER_QUESTION};

/// Filters candidate records down to well-formed questions. Total: malformed
/// records are dropped (logged and counted), never surfaced as errors.
/// Treating zero survivors as a failure is the gateway's job.
pub fn filter_valid(records: Vec<Value>) -> Vec<Question> {
    records
        .into_iter()
        .enumerate()
        .filter_map(|(index, record)| match coerce(&record) {
            Ok(question) => Some(question),
            Err(reason) => {
                tracing::warn!(index, reason, "Dropping malformed question record");
                QUESTIONS_DISCARDED_TOTAL.with_label_values(&[reason]).inc();
                None
            }
        })
        .collect()
}

fn coerce(record: &Value) -> Result<Question, &'static str> {
    let question = record
        .get("question")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .ok_or("missing_question")?;

    let options = record
        .get("options")
        .and_then(Value::as_array)
        .ok_or("bad_options")?;
    if options.len() != OPTIONS_PER_QUESTION {
        return Err("bad_options");
    }
    let options: Vec<String> = options
        .iter()
        .map(|option| option.as_str().map(str::to_string))
        .collect::<Option<_>>()
        .ok_or("bad_options")?;

    let correct_answer_index = record
        .get("correctAnswerIndex")
        .and_then(Value::as_u64)
        .filter(|index| (*index as usize) < OPTIONS_PER_QUESTION)
        .ok_or("bad_answer_index")? as usize;

    let explanation = record
        .get("explanation")
        .and_then(Value::as_str)
        .ok_or("missing_explanation")?;

    Ok(Question {
        question: question.to_string(),
        options,
        correct_answer_index,
        explanation: explanation.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record() -> Value {
        json!({
            "question": "Which gas is most abundant in air?",
            "options": ["Oxygen", "Nitrogen", "Argon", "CO2", "Helium"],
            "correctAnswerIndex": 1,
            "explanation": "Nitrogen makes up about 78% of air."
        })
    }

    #[test]
    fn accepts_a_well_formed_record() {
        let questions = filter_valid(vec![record()]);
        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].correct_answer_index, 1);
        assert_eq!(questions[0].options.len(), 5);
    }

    #[test]
    fn drops_record_with_four_options() {
        let mut bad = record();
        bad["options"] = json!(["a", "b", "c", "d"]);
        assert!(filter_valid(vec![bad]).is_empty());
    }

    #[test]
    fn drops_record_with_out_of_range_index() {
        let mut bad = record();
        bad["correctAnswerIndex"] = json!(5);
        assert!(filter_valid(vec![bad]).is_empty());

        let mut negative = record();
        negative["correctAnswerIndex"] = json!(-1);
        assert!(filter_valid(vec![negative]).is_empty());
    }

    #[test]
    fn drops_record_with_blank_question_text() {
        let mut bad = record();
        bad["question"] = json!("   ");
        assert!(filter_valid(vec![bad]).is_empty());
    }

    #[test]
    fn drops_record_without_explanation() {
        let mut bad = record();
        bad.as_object_mut().unwrap().remove("explanation");
        assert!(filter_valid(vec![bad]).is_empty());
    }

    #[test]
    fn drops_record_with_non_string_options() {
        let mut bad = record();
        bad["options"] = json!(["a", "b", "c", "d", 5]);
        assert!(filter_valid(vec![bad]).is_empty());
    }

    #[test]
    fn keeps_the_good_and_drops_the_bad() {
        let mut bad = record();
        bad["options"] = json!([]);
        let questions = filter_valid(vec![record(), bad, record()]);
        assert_eq!(questions.len(), 2);
    }
}
