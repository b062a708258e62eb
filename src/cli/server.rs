use clap::Parser;
use log::{error, info};
use prometheus::{BasicAuthentication, labels};
use rand::distr::{Alphanumeric, SampleString};
use tokio::net::TcpListener;
use tokio::task::spawn_blocking;
use tokio::time::{Duration, sleep};

use crate::cli::{SubCommandExtend, open_index};
use crate::config::{IndexOptions, Opts};
use crate::server;

#[derive(Parser, Debug, Clone)]
pub struct ServerCommand {
    #[command(flatten)]
    pub index: IndexOptions,
    /// 监听地址
    #[arg(long, default_value = "127.0.0.1:8000")]
    pub addr: String,
    /// 请求验证 token，不填则随机生成
    #[arg(long, default_value_t = String::new())]
    pub token: String,
    /// prometheus 主动推送地址
    #[arg(long, value_name = "URL")]
    pub prometheus_push: Option<String>,
    /// 自定义 instance 标签值
    #[arg(long, value_name = "NAME")]
    pub prometheus_instance: Option<String>,
    /// prometheus 认证信息，格式为 username:password
    #[arg(long, value_name = "AUTH", value_parser = parse_auth)]
    pub prometheus_auth: Option<(String, String)>,
}

impl SubCommandExtend for ServerCommand {
    async fn run(&self, opts: &Opts) -> anyhow::Result<()> {
        let index = open_index(opts, &self.index)?;

        let mut token = self.token.clone();
        if token.is_empty() {
            token = Alphanumeric.sample_string(&mut rand::rng(), 32);
            info!("鉴权 token: {}", token);
        }

        let state = server::AppState::new(index, token);
        let app = server::create_app(state);

        if let Some(url) = self.prometheus_push.clone() {
            let instance = self.prometheus_instance.clone().unwrap_or_else(|| self.addr.clone());
            tokio::spawn(push_metrics_loop(url, instance, self.prometheus_auth.clone()));
        }

        info!("服务器启动：http://{}", &self.addr);
        let listener = TcpListener::bind(&self.addr).await?;
        axum::serve(listener, app).await?;

        Ok(())
    }
}

/// 每 30 秒向 pushgateway 推送一次指标
async fn push_metrics_loop(url: String, instance: String, auth: Option<(String, String)>) {
    loop {
        let metric_families = prometheus::gather();
        let url = url.clone();
        let instance = instance.clone();
        let auth = auth.clone();
        let r = spawn_blocking(move || {
            prometheus::push_metrics(
                "imsig",
                labels! {
                    "instance".to_string() => instance,
                },
                &url,
                metric_families,
                auth.map(|(username, password)| BasicAuthentication { username, password }),
            )
        })
        .await;
        match r {
            Ok(Err(e)) => error!("推送指标失败: {e}"),
            Err(e) => error!("推送任务异常退出: {e}"),
            Ok(Ok(())) => {}
        }
        sleep(Duration::from_secs(30)).await;
    }
}

fn parse_auth(s: &str) -> Result<(String, String), String> {
    match s.split_once(':') {
        Some((username, password)) => Ok((username.to_string(), password.to_string())),
        None => Err(format!("无效的认证信息，应为 username:password: {}", s)),
    }
}
