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

use crate::config::settings::TorSettings;
use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tracing::debug;

/// 默认的控制认证cookie位置
const DEFAULT_COOKIE_PATH: &str = "/var/run/tor/control.authcookie";

/// 电路控制错误类型
///
/// 轮换失败始终可恢复，调用方记录后在现有电路上继续
#[derive(Error, Debug)]
pub enum CircuitError {
    #[error("Could not connect to control port {0}: {1}")]
    Connect(u16, std::io::Error),

    #[error("Authentication rejected: {0}")]
    AuthRejected(String),

    #[error("Control cookie unreadable at {0:?}: {1}")]
    Cookie(PathBuf, std::io::Error),

    #[error("Unexpected control reply: {0}")]
    Protocol(String),

    #[error("Control connection I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// 电路控制特质
#[async_trait]
pub trait CircuitControl: Send + Sync {
    /// 请求放弃当前电路并建立新电路
    async fn rotate(&self) -> Result<(), CircuitError>;
}

/// Tor控制端口客户端
///
/// 通过控制协议发送NEWNYM信号；连接在函数作用域内持有，
/// 无论认证结果如何，所有退出路径都会关闭连接
pub struct TorControl {
    port: u16,
    password: Option<String>,
    cookie_path: Option<PathBuf>,
    connect_timeout: Duration,
}

impl TorControl {
    /// 创建控制客户端
    ///
    /// # 参数
    ///
    /// * `port` - 控制端口
    /// * `password` - 控制密码（可选，优先使用）
    /// * `cookie_path` - cookie文件路径（可选，缺省时尝试默认位置）
    pub fn new(port: u16, password: Option<String>, cookie_path: Option<PathBuf>) -> Self {
        Self {
            port,
            password,
            cookie_path,
            connect_timeout: Duration::from_secs(10),
        }
    }

    /// 从Tor配置构建控制客户端
    pub fn from_settings(settings: &TorSettings) -> Self {
        Self::new(
            settings.control_port,
            settings.control_password.clone(),
            settings.control_cookie_path.as_ref().map(PathBuf::from),
        )
    }

    /// 组装认证命令
    ///
    /// 密码优先；否则读取cookie文件并以十六进制形式认证
    fn auth_command(&self) -> Result<String, CircuitError> {
        if let Some(password) = &self.password {
            return Ok(format!("AUTHENTICATE \"{}\"", escape_password(password)));
        }

        let cookie_path = self
            .cookie_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_COOKIE_PATH));
        let cookie = std::fs::read(&cookie_path)
            .map_err(|e| CircuitError::Cookie(cookie_path.clone(), e))?;
        Ok(format!("AUTHENTICATE {}", hex::encode(cookie)))
    }
}

/// 控制协议的密码转义
fn escape_password(password: &str) -> String {
    password.replace('\\', "\\\\").replace('"', "\\\"")
}

/// 回复是否为250成功状态
fn is_ok_reply(reply: &str) -> bool {
    reply.starts_with("250")
}

#[async_trait]
impl CircuitControl for TorControl {
    /// 发送NEWNYM信号请求新电路
    ///
    /// # 返回值
    ///
    /// * `Ok(())` - 信号被接受；调用方在下次抓取前应静置片刻，
    ///   新电路并不保证立即可用
    /// * `Err(CircuitError)` - 连接、认证或协议失败
    async fn rotate(&self) -> Result<(), CircuitError> {
        let auth = self.auth_command()?;

        let stream = tokio::time::timeout(
            self.connect_timeout,
            TcpStream::connect(("127.0.0.1", self.port)),
        )
        .await
        .map_err(|_| {
            CircuitError::Connect(
                self.port,
                std::io::Error::new(std::io::ErrorKind::TimedOut, "connect timed out"),
            )
        })?
        .map_err(|e| CircuitError::Connect(self.port, e))?;

        let (read_half, mut write_half) = stream.into_split();
        let mut reader = BufReader::new(read_half).lines();

        write_half.write_all(auth.as_bytes()).await?;
        write_half.write_all(b"\r\n").await?;
        let reply = reader.next_line().await?.unwrap_or_default();
        if !is_ok_reply(&reply) {
            return Err(CircuitError::AuthRejected(reply));
        }

        write_half.write_all(b"SIGNAL NEWNYM\r\n").await?;
        let reply = reader.next_line().await?.unwrap_or_default();
        if !is_ok_reply(&reply) {
            return Err(CircuitError::Protocol(reply));
        }

        debug!(port = self.port, "NEWNYM accepted");
        // Best-effort goodbye; the stream closes when the halves drop
        let _ = write_half.write_all(b"QUIT\r\n").await;
        Ok(())
    }
}
