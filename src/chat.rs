use llm_interface::CommentGenerator;
use std::io::{self, BufRead, Write};
use takotako_core::GenerationResult;

const CYAN: &str = "1;36";
const YELLOW: &str = "1;33";
const GREEN: &str = "1;32";
const RED: &str = "1;31";
const MAGENTA: &str = "1;35";

#[derive(Debug, PartialEq, Eq)]
pub enum ChatInput {
    Quit,
    Restart,
    Empty,
    Content(String),
}

impl ChatInput {
    pub fn classify(raw: &str) -> Self {
        let content = raw.trim();
        match content.to_lowercase().as_str() {
            "q" | "quit" => Self::Quit,
            "r" | "restart" => Self::Restart,
            "" => Self::Empty,
            _ => Self::Content(content.to_string()),
        }
    }
}

fn print_colored(out: &mut impl Write, text: &str, code: &str) -> io::Result<()> {
    writeln!(out, "\x1b[{code}m{text}\x1b[0m")
}

/// Reads lines until two consecutive blank lines, or a blank first line.
/// Returns `None` at end of input.
pub fn read_multiline(input: &mut impl BufRead) -> io::Result<Option<String>> {
    let mut lines: Vec<String> = Vec::new();
    let mut buf = String::new();

    loop {
        buf.clear();
        if input.read_line(&mut buf)? == 0 {
            if lines.is_empty() {
                return Ok(None);
            }
            break;
        }

        let line = buf.trim_end_matches(['\r', '\n']);
        if line.is_empty() && lines.last().map_or(true, |prev| prev.is_empty()) {
            break;
        }
        lines.push(line.to_string());
    }

    Ok(Some(lines.join("\n").trim().to_string()))
}

pub async fn run(
    generator: &CommentGenerator,
    input: &mut impl BufRead,
    out: &mut impl Write,
) -> io::Result<()> {
    print_colored(out, "欢迎使用TakoTako系统！", CYAN)?;
    print_colored(out, "输入 'q' 或 'quit' 退出程序", YELLOW)?;
    print_colored(out, "输入内容后按两次回车提交", YELLOW)?;

    loop {
        print_colored(out, "请输入要评论的内容（输入完成后按两次回车结束）：", GREEN)?;
        out.flush()?;

        let Some(raw) = read_multiline(input)? else {
            break;
        };

        let content = match ChatInput::classify(&raw) {
            ChatInput::Quit => break,
            ChatInput::Restart => continue,
            ChatInput::Empty => {
                print_colored(out, "内容不能为空，请重新输入！", RED)?;
                continue;
            }
            ChatInput::Content(content) => content,
        };

        print_colored(out, "\n正在生成评论...", YELLOW)?;
        out.flush()?;

        match generator.generate(&content).await {
            GenerationResult::Success { reasoning, comment } => {
                print_colored(out, "\nTakoTako思考过程：", MAGENTA)?;
                writeln!(out, "{reasoning}")?;
                print_colored(out, "\nTakoTako评论：", MAGENTA)?;
                writeln!(out, "{comment}")?;
                print_colored(out, &format!("\n{}", "=".repeat(50)), YELLOW)?;
            }
            GenerationResult::Error { error } => {
                print_colored(out, &format!("发生错误：{error}"), RED)?;
            }
        }
    }

    print_colored(out, "\n感谢使用！再见！", CYAN)?;
    Ok(())
}
