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

use crate::domain::models::seed_link::SeedLink;
use crate::engines::traits::PageTransport;
use futures::stream::{self, StreamExt};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

/// 暗网搜索端点，`{query}`处填入关键词
const SEARCH_ENDPOINTS: [&str; 14] = [
    "http://juhanurmihxlp77nkq76byazcldy2hlmovfu2epvl5ankdibsot4csyd.onion/search/?q={query}",
    "http://3bbad7fauom4d6sgppalyqddsqbf5u5p56b5k5uk2zxsy3d6ey2jobad.onion/search?q={query}",
    "http://darkhuntyla64h75a3re5e2l3367lqn7ltmdzpgmr6b4nbz3q2iaxrid.onion/search?q={query}",
    "http://iy3544gmoeclh5de6gez2256v6pjh4omhpqdh2wpeeppjtvqmjhkfwad.onion/torgle/?query={query}",
    "http://amnesia7u5odx5xbwtpnqk3edybgud5bmiagu75bnqx2crntw5kry7ad.onion/search?query={query}",
    "http://kaizerwfvp5gxu6cppibp7jhcqptavq3iqef66wbxenh6a2fklibdvid.onion/search?q={query}",
    "http://anima4ffe27xmakwnseih3ic2y7y3l6e7fucwk4oerdn4odf7k74tbid.onion/search?q={query}",
    "http://tornadoxn3viscgz647shlysdy7ea5zqzwda7hierekeuokh5eh5b3qd.onion/search?q={query}",
    "http://tornetupfu7gcgidt33ftnungxzyfq2pygui5qdoyss34xbgx2qruzid.onion/search?q={query}",
    "http://torlbmqwtudkorme6prgfpmsnile7ug2zm4u3ejpcncxuhpu4k2j4kyd.onion/index.php?a=search&q={query}",
    "http://findtorroveq5wdnipkaojfpqulxnkhblymc7aramjzajcvpptd4rjqd.onion/search?q={query}",
    "http://2fd6cemt4gmccflhm6imvdfvli3nf7zn6rfrwpsy7uhxrgbypvwf5fad.onion/search?query={query}",
    "http://oniwayzz74cv2puhsgx4dpjwieww4wdphsydqvf5q7eyz4myjvyw26ad.onion/search.php?s={query}",
    "http://tor66sewebgixwhcqfnp5inzp5x5uohhdy3kvtnyfxc2e5mxiuh34iid.onion/search?q={query}",
];

static RE_ONION_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"https?://[^/\s"'<>]*\.onion(?:/[^\s"'<>]*)?"#)
        .expect("Failed to compile onion url regex")
});

/// 种子发现器
///
/// 以固定大小的工作池并发查询暗网搜索端点，将各端点乱序完成的结果
/// 汇聚到单一消费者处按URL去重
pub struct SeedFinder<T: PageTransport> {
    transport: Arc<T>,
    workers: usize,
}

impl<T: PageTransport> SeedFinder<T> {
    /// 创建种子发现器
    ///
    /// # 参数
    ///
    /// * `transport` - 匿名传输（所有搜索请求都经代理）
    /// * `workers` - 并发端点数
    pub fn new(transport: Arc<T>, workers: usize) -> Self {
        Self { transport, workers }
    }

    /// 按关键词发现候选种子链接
    ///
    /// 单个端点失败或返回非200只记录日志；结果按URL去重，首次出现优先
    ///
    /// # 参数
    ///
    /// * `keyword` - 搜索关键词
    ///
    /// # 返回值
    ///
    /// 去重后的种子链接列表
    pub async fn discover(&self, keyword: &str) -> Vec<SeedLink> {
        let fetches = SEARCH_ENDPOINTS.iter().map(|endpoint| {
            let url = endpoint.replace("{query}", keyword);
            let transport = Arc::clone(&self.transport);
            async move {
                info!(%url, "querying search endpoint");
                match transport.get(&url).await {
                    Ok(response) if response.is_success() => extract_onion_links(&response.body),
                    Ok(response) => {
                        warn!(%url, status = response.status_code, "search endpoint refused");
                        Vec::new()
                    }
                    Err(e) => {
                        warn!(%url, error = %e, "search endpoint unreachable");
                        Vec::new()
                    }
                }
            }
        });

        let mut batches = stream::iter(fetches).buffer_unordered(self.workers);

        let mut seen: HashSet<String> = HashSet::new();
        let mut unique: Vec<SeedLink> = Vec::new();
        while let Some(links) = batches.next().await {
            for link in links {
                if seen.insert(link.url.clone()) {
                    unique.push(link);
                }
            }
        }
        info!(keyword, links = unique.len(), "seed discovery finished");
        unique
    }
}

/// 从搜索结果页提取onion链接
fn extract_onion_links(html: &str) -> Vec<SeedLink> {
    let document = Html::parse_document(html);
    let anchors = Selector::parse("a").expect("Failed to parse anchor selector");

    document
        .select(&anchors)
        .filter_map(|anchor| {
            let href = anchor.value().attr("href")?;
            let matched = RE_ONION_URL.find(href)?;
            Some(SeedLink {
                title: anchor.text().collect::<String>().trim().to_string(),
                url: matched.as_str().to_string(),
            })
        })
        .collect()
}

/// 将发现的链接写入种子文件
///
/// # 参数
///
/// * `dir` - 种子目录（不存在则创建）
/// * `keyword` - 关键词，决定文件名
/// * `links` - 发现的链接
///
/// # 返回值
///
/// * `Ok(PathBuf)` - 写入的文件路径
/// * `Err(std::io::Error)` - 写入失败
pub fn write_seed_file(
    dir: &Path,
    keyword: &str,
    links: &[SeedLink],
) -> Result<PathBuf, std::io::Error> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(format!("{}.txt", keyword));
    let mut contents = String::new();
    for link in links {
        contents.push_str(&link.url);
        contents.push('\n');
    }
    std::fs::write(&path, contents)?;
    Ok(path)
}
