use std::env;
use std::hint::black_box;
use std::time::Duration;

use criterion::Criterion;
use spark_rpc_codec::ProtocolVersions;
use spark_rpc_core::{Capability, DataFormat, Provider, RequestMetadata, Version, tags};

fn sample_request() -> RequestMetadata {
    let capability = Capability::new("inventory.reserve", Version::new(3, 1, 0));
    let provider = Provider::new("inventory-primary", Version::new(3, 1, 4), capability);
    let mut request = RequestMetadata::for_provider(2, DataFormat::PROTOBUF, &provider)
        .with_async_task_id("task-000042");
    request.tag_values.insert_text(tags::WORKER_ID, "worker-a");
    request.tag_values.insert_text(tags::TRACE_ID, "4bf92f3577b34da6a3ce929d0e0e4736");
    request
}

fn bench_metadata(c: &mut Criterion) {
    let versions = ProtocolVersions::standard();
    let request = sample_request();
    let frame = versions.encode_request(&request).expect("样例可编码");

    c.bench_function("request_metadata/encode_v2", |b| {
        b.iter(|| versions.encode_request(black_box(&request)))
    });
    c.bench_function("request_metadata/decode_v2", |b| {
        b.iter(|| versions.decode_request(black_box(frame.clone())))
    });
}

fn main() {
    let quick_mode = env::args().skip(1).any(|arg| arg == "--quick");

    let mut criterion = Criterion::default();
    if quick_mode {
        criterion = criterion
            .sample_size(10)
            .warm_up_time(Duration::from_millis(100))
            .measurement_time(Duration::from_millis(250));
    }

    bench_metadata(&mut criterion);
    criterion.final_summary();
}
