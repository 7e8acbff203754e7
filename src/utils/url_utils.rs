// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use url::Url;

/// 提取URL的主机名
///
/// # 参数
///
/// * `url` - 待解析的URL
///
/// # 返回值
///
/// 解析成功时返回主机名，否则返回None
pub fn host_of(url: &str) -> Option<String> {
    Url::parse(url).ok()?.host_str().map(str::to_string)
}

/// 判断URL是否指向onion站点
pub fn is_onion(url: &str) -> bool {
    host_of(url).is_some_and(|host| host.ends_with(".onion"))
}
