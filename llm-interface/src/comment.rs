//! Sardonic comment generation.
//!
//! One provider call per [`CommentGenerator::generate`]: the model is asked to
//! reason step by step, then emit `===`, then the final comment. The raw text
//! is split by [`parse_generation`]; any failure on the way becomes a
//! [`GenerationResult::Error`].

use crate::LlmProvider;
use std::sync::Arc;
use takotako_core::{ErrorExt, GenerationResult, SamplingParams};
use thiserror::Error;
use tracing::{debug, warn};

pub const DELIMITER: &str = "===";

/// Upper bound of the comment length policy, in characters.
pub const MAX_COMMENT_CHARS: usize = 30;

pub const SYSTEM_PROMPT: &str = "你是一位毒舌有趣的评论家，善于用幽默调侃的方式进行评论。要让评论简短、有趣、略带嘲讽但不过分。";

const USER_PROMPT_TEMPLATE: &str = r#"你是一位毒舌评论大师，善于用犀利、嘲讽的方式对内容进行评论。请按照以下思维步骤进行分析：
步骤1 - 分析内容：
- 分析用户的文章类型，如故事、日志、闲聊、抱怨等
- 总结用户的言论主题，如情感、友情、爱慕、怀疑等

步骤2 - 寻找槽点：
- 识别内容中最容易被嘲讽的点
- 找出用户言论中的自我暴露
- 发现潜在的讽刺矛盾点

步骤3 - 选择攻击角度：
- 夸张放大：把小缺点放大成大问题
- 反讽对比：用反面例子突出讽刺效果
- 虚假关心：用关心的语气表达嘲讽
- 阴阳怪气：用反话正说或正话反说
- 无情揭露“真相”：用冷嘲热讽的方式揭示某些自以为是的行为背后的“真相”
- 对象转移：从用户实际抱怨转移到用户本身
- 用实际反击虚构：以实际反击虚构对方的言辞或态度

步骤4 - 构建嘲讽：
- 用词要带刺，不需要顾忌用户情绪
- 语气要欠揍
- 结构要简短有力
- 要让人又气又笑

步骤5 - 选择评论对象：
- 针对策略：故事过于荒诞时，往往是用户编造的，此时尝试攻击用户本身
- 防护策略：如果用户非常悲伤且敏感，尽量选择不折磨用户的话语
- 正常策略：用户日常分享，结合内容进行犀利评价

参考示例：
用户：这次姨妈走后要严格执行跳绳计划
思路：抓住体重这个敏感点 + 夸张比喻 + 虚假关心
评论：跳绳前记得检查楼下屋顶结实不，别穿洞了哈哈

用户：爆睡四小时。。牛牛的
思路：抓住时间短 + 阴阳怪气 + 反讽
评论：牛牛这是在储备能量，准备大干一场吧

评论要求：
- 字数限制：5-30字
- 语气：犀利，可根据内容越界
- 重点：抓住最讽刺的槽点
- 效果：让人又气又想笑

用户内容：{content}

根据用户内容进行逐步分析，给出逐步思考的过程
根据所有的思考内容，给出最终评论
思考过程用'==='与最终评论分隔开
"#;

pub fn build_user_prompt(content: &str) -> String {
    USER_PROMPT_TEMPLATE.replace("{content}", content)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedGeneration {
    pub reasoning: String,
    pub comment: String,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("model output is missing the '===' delimiter")]
    MissingDelimiter,

    #[error("model output has nothing after the '===' delimiter")]
    EmptyComment,
}

/// Splits raw model output at the first delimiter.
///
/// Longer runs such as `=====` count as one delimiter. If the model repeats
/// the delimiter, only the section between the first and second one is the
/// comment.
pub fn parse_generation(raw: &str) -> Result<ParsedGeneration, ParseError> {
    let (reasoning, rest) = raw
        .split_once(DELIMITER)
        .ok_or(ParseError::MissingDelimiter)?;

    let rest = rest.trim_start_matches('=');
    let comment = rest.split(DELIMITER).next().unwrap_or_default().trim();
    if comment.is_empty() {
        return Err(ParseError::EmptyComment);
    }

    Ok(ParsedGeneration {
        reasoning: reasoning.trim().to_string(),
        comment: comment.to_string(),
    })
}

/// Soft length/content policy. Violations are reported, never enforced.
pub fn policy_violations(parsed: &ParsedGeneration) -> Vec<String> {
    let mut violations = Vec::new();
    let chars = parsed.comment.chars().count();
    if chars == 0 || chars > MAX_COMMENT_CHARS {
        violations.push(format!(
            "comment is {} characters, policy is 1-{}",
            chars, MAX_COMMENT_CHARS
        ));
    }
    if parsed.reasoning.is_empty() {
        violations.push("reasoning section is empty".to_string());
    }
    violations
}

#[derive(Clone)]
pub struct CommentGenerator {
    provider: Arc<dyn LlmProvider>,
    sampling: SamplingParams,
}

impl CommentGenerator {
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self {
            provider,
            sampling: SamplingParams::default(),
        }
    }

    pub fn with_sampling(mut self, sampling: SamplingParams) -> Self {
        self.sampling = sampling;
        self
    }

    /// Generates a `(reasoning, comment)` pair for `content`.
    ///
    /// Empty content is forwarded to the provider as is; boundary callers
    /// validate input themselves.
    pub async fn generate(&self, content: &str) -> GenerationResult {
        let user_prompt = build_user_prompt(content);

        let raw = match self
            .provider
            .complete(SYSTEM_PROMPT, &user_prompt, &self.sampling)
            .await
        {
            Ok(raw) => raw,
            Err(e) => {
                e.log_warn();
                return GenerationResult::error(e.to_string());
            }
        };

        match parse_generation(&raw) {
            Ok(parsed) => {
                for violation in policy_violations(&parsed) {
                    warn!("Comment policy: {}", violation);
                }
                debug!("Generated comment via {}: {}", self.provider.name(), parsed.comment);
                GenerationResult::success(parsed.reasoning, parsed.comment)
            }
            Err(e) => {
                warn!("Malformed generation output: {}", e);
                GenerationResult::error(e.to_string())
            }
        }
    }
}
