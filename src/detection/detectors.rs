// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::domain::models::indicator::IndicatorType;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{HashMap, HashSet};

// 保守的高精度正则，宁可漏报也不误报
static RE_CREDENTIAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b([A-Za-z0-9._%+-]+:[^\s]{6,})\b").expect("Failed to compile credential regex")
});
static RE_EMAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b")
        .expect("Failed to compile email regex")
});
static RE_BTC: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b([13][a-km-zA-HJ-NP-Z1-9]{25,34})\b").expect("Failed to compile btc regex")
});
static RE_ETH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b0x[a-fA-F0-9]{40}\b").expect("Failed to compile eth regex"));
static RE_CREDIT_CARD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:\d[ -]*?){13,16}\b").expect("Failed to compile credit card regex")
});
static RE_SQLI: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(union select|drop table|--\s|;--|or 1=1)")
        .expect("Failed to compile sqli regex")
});

/// 在归一化文本上运行固定的检测器组
///
/// # 参数
///
/// * `text` - 小写、空白折叠后的纯文本
///
/// # 返回值
///
/// 指标类型到命中值列表的映射；没有任何命中时为空映射，
/// 缺少某个键表示该类型没有命中
pub fn detect_indicators(text: &str) -> HashMap<IndicatorType, Vec<String>> {
    let mut found: HashMap<IndicatorType, Vec<String>> = HashMap::new();
    if text.is_empty() {
        return found;
    }

    let credentials: Vec<String> = RE_CREDENTIAL
        .captures_iter(text)
        .map(|cap| cap[1].to_string())
        .collect();
    if !credentials.is_empty() {
        found.insert(IndicatorType::CredentialLeak, credentials);
    }

    // 邮箱去重，保留首次出现的顺序
    let mut seen = HashSet::new();
    let emails: Vec<String> = RE_EMAIL
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .filter(|email| seen.insert(email.clone()))
        .collect();
    if !emails.is_empty() {
        found.insert(IndicatorType::Email, emails);
    }

    let btc: Vec<String> = RE_BTC
        .captures_iter(text)
        .map(|cap| cap[1].to_string())
        .collect();
    if !btc.is_empty() {
        found.insert(IndicatorType::BtcAddress, btc);
    }

    let eth: Vec<String> = RE_ETH
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect();
    if !eth.is_empty() {
        found.insert(IndicatorType::EthAddress, eth);
    }

    let cards: Vec<String> = RE_CREDIT_CARD
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect();
    if !cards.is_empty() {
        found.insert(IndicatorType::CreditCardLike, cards);
    }

    let sqli: Vec<String> = RE_SQLI
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect();
    if !sqli.is_empty() {
        found.insert(IndicatorType::SqliSignature, sqli);
    }

    found
}

/// 计算匹配值的证据窗口
///
/// 在归一化文本中定位首次出现的匹配值，截取两侧各 `radius` 个字符。
/// 匹配值无法定位时返回None，由调用方退回到页面摘要。
pub fn evidence_window(text: &str, needle: &str, radius: usize) -> Option<String> {
    if needle.is_empty() {
        return None;
    }
    let start_byte = text.find(needle)?;
    let end_byte = start_byte + needle.len();

    let window_start = text[..start_byte]
        .char_indices()
        .rev()
        .take(radius)
        .last()
        .map(|(idx, _)| idx)
        .unwrap_or(start_byte);
    let window_end = text[end_byte..]
        .char_indices()
        .nth(radius)
        .map(|(idx, _)| end_byte + idx)
        .unwrap_or(text.len());

    Some(text[window_start..window_end].to_string())
}
