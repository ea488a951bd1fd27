//! Image-to-image generation example.
//!
//! Run with:
//! ```bash
//! export MODELSCOPE_API_KEY="your-api-key"
//! cargo run --example generate -- input.png "make it a watercolor painting" output.png
//! ```

use std::env;
use std::time::Duration;

use modelscope_kontext::{Client, GenerationParams, ImageBuffer};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let api_key =
        env::var("MODELSCOPE_API_KEY").expect("MODELSCOPE_API_KEY environment variable not set");

    let mut args = env::args().skip(1);
    let input = args.next().unwrap_or_else(|| "input.png".to_string());
    let prompt = args
        .next()
        .unwrap_or_else(|| "make it a watercolor painting".to_string());
    let output = args.next().unwrap_or_else(|| "output.png".to_string());

    let image = ImageBuffer::decode(&std::fs::read(&input)?)?;
    println!("loaded {} ({}x{})", input, image.width(), image.height());

    let client = Client::builder(api_key)
        .poll_interval(Duration::from_secs(5))
        .max_polls(120)
        .build()?;

    let params = GenerationParams {
        prompt,
        width: 1024,
        height: 1024,
        ..Default::default()
    };

    let result = client.generate(&image, &params).await?;
    std::fs::write(&output, result.encode_png()?)?;
    println!(
        "wrote {} ({}x{})",
        output,
        result.width(),
        result.height()
    );

    Ok(())
}
