use serde_json::Value;

use crate::types::Direction;

#[derive(Debug, PartialEq)]
pub enum ParsedClientMessage {
    JoinAs { role: String },
    LeaveRole { role: Option<String> },
    Move { direction: Direction },
    AdminSetMaze { maze_index: i64 },
    RestartFirstMaze,
}

/// Parses one inbound text frame. Anything malformed is `None`.
pub fn parse_client_message(raw: &str) -> Option<ParsedClientMessage> {
    let value: Value = serde_json::from_str(raw).ok()?;
    let object = value.as_object()?;
    let message_type = object.get("type")?.as_str()?;

    match message_type {
        "join-as" => {
            let role = object.get("role")?.as_str()?.to_string();
            Some(ParsedClientMessage::JoinAs { role })
        }
        "leave-role" => {
            let role = match object.get("role") {
                None | Some(Value::Null) => None,
                Some(value) => Some(value.as_str()?.to_string()),
            };
            Some(ParsedClientMessage::LeaveRole { role })
        }
        "move" => {
            let direction = Direction::parse_move(object.get("direction")?.as_str()?)?;
            Some(ParsedClientMessage::Move { direction })
        }
        "admin-set-maze" => {
            let maze_index = parse_index(object.get("mazeIndex")?)?;
            Some(ParsedClientMessage::AdminSetMaze { maze_index })
        }
        "restart-first-maze" => Some(ParsedClientMessage::RestartFirstMaze),
        _ => None,
    }
}

/// Accepts integral JSON numbers only; `2.0` is fine, `2.5` is not.
fn parse_index(value: &Value) -> Option<i64> {
    if let Some(number) = value.as_i64() {
        return Some(number);
    }
    let number = value.as_f64()?;
    if !number.is_finite() || number.fract() != 0.0 {
        return None;
    }
    if number < i64::MIN as f64 || number >= i64::MAX as f64 {
        return None;
    }
    Some(number as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_join_as_message() {
        let parsed = parse_client_message(r#"{"type":"join-as","role":"X"}"#);
        assert_eq!(
            parsed,
            Some(ParsedClientMessage::JoinAs {
                role: "X".to_string()
            })
        );
    }

    #[test]
    fn join_as_requires_string_role() {
        assert!(parse_client_message(r#"{"type":"join-as"}"#).is_none());
        assert!(parse_client_message(r#"{"type":"join-as","role":3}"#).is_none());
    }

    #[test]
    fn leave_role_name_is_optional() {
        assert_eq!(
            parse_client_message(r#"{"type":"leave-role"}"#),
            Some(ParsedClientMessage::LeaveRole { role: None })
        );
        assert_eq!(
            parse_client_message(r#"{"type":"leave-role","role":"Y"}"#),
            Some(ParsedClientMessage::LeaveRole {
                role: Some("Y".to_string())
            })
        );
    }

    #[test]
    fn parse_move_message() {
        let parsed = parse_client_message(r#"{"type":"move","direction":"left"}"#);
        assert_eq!(
            parsed,
            Some(ParsedClientMessage::Move {
                direction: Direction::Left
            })
        );
    }

    #[test]
    fn move_rejects_unknown_direction() {
        assert!(parse_client_message(r#"{"type":"move","direction":"north"}"#).is_none());
        assert!(parse_client_message(r#"{"type":"move"}"#).is_none());
    }

    #[test]
    fn admin_set_maze_accepts_integral_numbers_only() {
        assert_eq!(
            parse_client_message(r#"{"type":"admin-set-maze","mazeIndex":4}"#),
            Some(ParsedClientMessage::AdminSetMaze { maze_index: 4 })
        );
        assert_eq!(
            parse_client_message(r#"{"type":"admin-set-maze","mazeIndex":4.0}"#),
            Some(ParsedClientMessage::AdminSetMaze { maze_index: 4 })
        );
        assert_eq!(
            parse_client_message(r#"{"type":"admin-set-maze","mazeIndex":-2}"#),
            Some(ParsedClientMessage::AdminSetMaze { maze_index: -2 })
        );
        assert!(parse_client_message(r#"{"type":"admin-set-maze","mazeIndex":1.5}"#).is_none());
        assert!(parse_client_message(r#"{"type":"admin-set-maze","mazeIndex":"1"}"#).is_none());
        assert!(parse_client_message(r#"{"type":"admin-set-maze","mazeIndex":1e300}"#).is_none());
    }

    #[test]
    fn restart_and_unknown_types() {
        assert_eq!(
            parse_client_message(r#"{"type":"restart-first-maze"}"#),
            Some(ParsedClientMessage::RestartFirstMaze)
        );
        assert!(parse_client_message(r#"{"type":"dance"}"#).is_none());
        assert!(parse_client_message("not json").is_none());
        assert!(parse_client_message(r#"["move"]"#).is_none());
    }
}
