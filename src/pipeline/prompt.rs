//! Prompt assembly for the compliance check.

use crate::dictionary::{PhraseCandidate, PhraseCategory};
use crate::gateway::{ChatMessage, ToolSpec};

/// Name of the function the model is asked to call with its findings.
pub const REPORT_TOOL: &str = "report_compliance_check";

const SYSTEM_PROMPT: &str = "あなたは薬機法(医薬品医療機器等法)と景品表示法に精通した広告審査の専門家です。\
広告文を審査し、法令に抵触するおそれのある表現をすべて指摘した上で、\
意図を保ったまま適法な表現に書き換えてください。\
位置は元の文章の文字単位のオフセット(0始まり、半開区間)で報告してください。\
必ず report_compliance_check 関数を呼び出して結果を報告してください。";

/// Tool declaration for structured result reporting.
///
/// The schema mirrors what the extractor parses: a full rewrite plus a
/// list of flagged spans with char offsets into the original text.
pub fn report_tool() -> ToolSpec {
    ToolSpec {
        name: REPORT_TOOL.to_string(),
        description: "薬機法チェックの結果を報告する".to_string(),
        parameters: serde_json::json!({
            "type": "object",
            "properties": {
                "modified": {
                    "type": "string",
                    "description": "法令に適合するよう書き換えた広告文の全文"
                },
                "violations": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "start_pos": {
                                "type": "integer",
                                "description": "違反箇所の開始位置(文字オフセット、0始まり)"
                            },
                            "end_pos": {
                                "type": "integer",
                                "description": "違反箇所の終了位置(半開区間)"
                            },
                            "reason": {
                                "type": "string",
                                "description": "違反と判断した理由"
                            },
                            "dictionary_id": {
                                "type": "string",
                                "description": "該当する辞書エントリのID(あれば)"
                            }
                        },
                        "required": ["start_pos", "end_pos", "reason"]
                    }
                }
            },
            "required": ["modified", "violations"]
        }),
    }
}

/// Build the message sequence for one check.
///
/// Dictionary candidates, when present, are folded into the user message
/// so the model favors known judgments over its own guesses.
pub fn build_messages(text: &str, candidates: &[PhraseCandidate]) -> Vec<ChatMessage> {
    let mut user = String::new();

    if !candidates.is_empty() {
        user.push_str("次の辞書情報を参考にしてください。\n");
        for candidate in candidates {
            let label = match candidate.category {
                PhraseCategory::Ng => "NG表現",
                PhraseCategory::Allow => "使用可能な表現",
            };
            user.push_str(&format!("- {}: {}\n", label, candidate.phrase));
        }
        user.push('\n');
    }

    user.push_str("以下の広告文を審査してください。\n\n");
    user.push_str(text);

    vec![ChatMessage::system(SYSTEM_PROMPT), ChatMessage::user(user)]
}
