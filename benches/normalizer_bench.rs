//! Benchmarks for SSE framing of fragments and backend frames.

use bytes::Bytes;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use futures::executor::block_on;
use futures::{stream, StreamExt};

use llm_relay::backend::framing::{parse_sse_event, FrameStreamExt};
use llm_relay::server::streaming::{fragments_to_sse, format_fragment};
use llm_relay::Error;

fn bench_format_fragment(c: &mut Criterion) {
    let single = "a typical token ";
    let multi = "Idea: AgentOps\n\nA platform that\nmonitors fleets of agents.";

    c.bench_function("format_fragment_single_line", |b| {
        b.iter(|| black_box(format_fragment(black_box(single))))
    });

    c.bench_function("format_fragment_multi_line", |b| {
        b.iter(|| black_box(format_fragment(black_box(multi))))
    });
}

fn bench_normalize_stream(c: &mut Criterion) {
    // Roughly a 1,000-token answer streamed token by token.
    let fragments: Vec<String> = (0..1_000)
        .map(|i| if i % 50 == 49 { "\n".to_string() } else { format!("tok{i} ") })
        .collect();

    c.bench_function("normalize_1k_fragments", |b| {
        b.iter(|| {
            let input = stream::iter(fragments.iter().cloned().map(Ok::<_, Error>));
            let bytes: usize = block_on(
                fragments_to_sse(input)
                    .map(|chunk| chunk.map(|c| c.len()).unwrap_or(0))
                    .fold(0, |acc, n| async move { acc + n }),
            );
            black_box(bytes);
        })
    });
}

fn bench_sse_frame_parsing(c: &mut Criterion) {
    let event = "event: response.output_text.delta\n\
                 data: {\"type\":\"response.output_text.delta\",\"delta\":\"tok \"}\n\n";
    let body: Bytes = Bytes::from(event.repeat(1_000));

    c.bench_function("split_and_parse_1k_sse_events", |b| {
        b.iter(|| {
            // Deliver in 512-byte transport chunks.
            let chunks: Vec<Result<Bytes, Error>> = body
                .chunks(512)
                .map(|c| Ok(Bytes::copy_from_slice(c)))
                .collect();
            let count = block_on(
                stream::iter(chunks)
                    .sse_frames()
                    .filter(|frame| {
                        let parsed = frame.as_ref().ok().and_then(|f| parse_sse_event(f)).is_some();
                        async move { parsed }
                    })
                    .count(),
            );
            black_box(count);
        })
    });
}

criterion_group!(
    benches,
    bench_format_fragment,
    bench_normalize_stream,
    bench_sse_frame_parsing
);
criterion_main!(benches);
