//! 控制台输入
//!
//! 把一行文本命令解析成事件循环的输入：
//!
//! ```text
//! place <x> <y> <z>   点击平面放置棋盘
//! tap <i> <j>         点击棋盘格子
//! board               打印棋盘
//! quit                退出
//! ```

use protocol::{Position, Vec3};
use thiserror::Error;

use crate::controller::HitTarget;
use crate::network::DriverEvent;
use crate::session::SessionEvent;

/// 命令解析错误
#[derive(Error, Debug, PartialEq)]
pub enum CommandError {
    #[error("Unknown command: {0}")]
    Unknown(String),

    #[error("Usage: {0}")]
    Usage(&'static str),

    #[error("Cell ({0}, {1}) is outside the board")]
    OutsideBoard(i32, i32),
}

const PLACE_USAGE: &str = "place <x> <y> <z>";
const TAP_USAGE: &str = "tap <i> <j>";

/// 解析一行命令，空行返回 None
pub fn parse_command(line: &str) -> Result<Option<DriverEvent>, CommandError> {
    let mut parts = line.split_whitespace();
    let Some(command) = parts.next() else {
        return Ok(None);
    };
    let args: Vec<&str> = parts.collect();

    let event = match command {
        "place" | "p" => {
            let [x, y, z] = parse_args::<f32, 3>(&args).ok_or(CommandError::Usage(PLACE_USAGE))?;
            DriverEvent::Session(SessionEvent::Tap(HitTarget::Surface(Vec3::new(x, y, z))))
        }
        "tap" | "t" => {
            let [i, j] = parse_args::<i32, 2>(&args).ok_or(CommandError::Usage(TAP_USAGE))?;
            let pos = Position::from_coords(i, j).ok_or(CommandError::OutsideBoard(i, j))?;
            DriverEvent::TapCell(pos)
        }
        "board" | "b" => DriverEvent::ShowBoard,
        "quit" | "q" | "exit" => DriverEvent::Quit,
        other => return Err(CommandError::Unknown(other.to_string())),
    };
    Ok(Some(event))
}

fn parse_args<T: std::str::FromStr + Copy + Default, const N: usize>(args: &[&str]) -> Option<[T; N]> {
    if args.len() != N {
        return None;
    }
    let mut values = [T::default(); N];
    for (value, arg) in values.iter_mut().zip(args) {
        *value = arg.parse().ok()?;
    }
    Some(values)
}

/// 命令帮助
pub fn help_text() -> String {
    format!(
        "commands: {} | {} | board | quit",
        PLACE_USAGE, TAP_USAGE
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tap() {
        match parse_command("tap 2 3") {
            Ok(Some(DriverEvent::TapCell(pos))) => assert_eq!(pos, Position::new_unchecked(2, 3)),
            other => panic!("Unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_parse_place() {
        match parse_command("  place 0.5 -1 2.25 ") {
            Ok(Some(DriverEvent::Session(SessionEvent::Tap(HitTarget::Surface(v))))) => {
                assert_eq!(v, Vec3::new(0.5, -1.0, 2.25));
            }
            other => panic!("Unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_parse_simple_commands() {
        assert!(matches!(parse_command("board"), Ok(Some(DriverEvent::ShowBoard))));
        assert!(matches!(parse_command("q"), Ok(Some(DriverEvent::Quit))));
        assert!(matches!(parse_command("   "), Ok(None)));
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(
            parse_command("tap 1").unwrap_err(),
            CommandError::Usage(TAP_USAGE)
        );
        assert_eq!(
            parse_command("tap a b").unwrap_err(),
            CommandError::Usage(TAP_USAGE)
        );
        assert_eq!(
            parse_command("tap 8 0").unwrap_err(),
            CommandError::OutsideBoard(8, 0)
        );
        assert_eq!(
            parse_command("jump").unwrap_err(),
            CommandError::Unknown("jump".to_string())
        );
    }
}
