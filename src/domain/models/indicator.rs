// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::fmt;
use std::str::FromStr;

/// 威胁指标类型
///
/// 检测器能够识别的固定指标集合
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndicatorType {
    /// 凭证泄露（identifier:secret形式）
    CredentialLeak,
    /// 电子邮箱地址
    Email,
    /// 比特币地址
    BtcAddress,
    /// 以太坊地址
    EthAddress,
    /// 疑似信用卡号序列
    CreditCardLike,
    /// SQL注入特征
    SqliSignature,
}

impl IndicatorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            IndicatorType::CredentialLeak => "credential-leak",
            IndicatorType::Email => "email",
            IndicatorType::BtcAddress => "btc-address",
            IndicatorType::EthAddress => "eth-address",
            IndicatorType::CreditCardLike => "credit-card-like",
            IndicatorType::SqliSignature => "sqli-signature",
        }
    }

    /// 根据指标类型查表得到严重性
    ///
    /// # 返回值
    ///
    /// 指标类型对应的固定严重性
    pub fn severity(&self) -> Severity {
        match self {
            IndicatorType::CredentialLeak => Severity::High,
            IndicatorType::BtcAddress => Severity::Medium,
            IndicatorType::EthAddress => Severity::Medium,
            IndicatorType::CreditCardLike => Severity::Medium,
            IndicatorType::SqliSignature => Severity::Medium,
            IndicatorType::Email => Severity::Low,
        }
    }
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IndicatorType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "credential-leak" => Ok(IndicatorType::CredentialLeak),
            "email" => Ok(IndicatorType::Email),
            "btc-address" => Ok(IndicatorType::BtcAddress),
            "eth-address" => Ok(IndicatorType::EthAddress),
            "credit-card-like" => Ok(IndicatorType::CreditCardLike),
            "sqli-signature" => Ok(IndicatorType::SqliSignature),
            other => Err(format!("unknown indicator type: {}", other)),
        }
    }
}

/// 指标严重性
///
/// 有序枚举：low < medium < high < critical
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 按存储的类型标签查表得到严重性
///
/// 无法识别的标签一律降级为low
pub fn severity_for_label(label: &str) -> Severity {
    label
        .parse::<IndicatorType>()
        .map(|kind| kind.severity())
        .unwrap_or(Severity::Low)
}
