use anyhow::Result;
use lecture_companion::utils::logging;
use lecture_companion::{App, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // 加载配置
    let config = Config::load()?;

    // 初始化日志
    logging::init(config.verbose_logging);

    // 初始化并运行应用
    App::initialize(config)?
        .run(std::env::args().skip(1).collect())
        .await
}
