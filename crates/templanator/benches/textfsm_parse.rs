use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;
use templanator::TextFsm;
use templanator::samples::{IP_INTERFACE_BRIEF, TEXTFSM_IP_INTERFACE_BRIEF};

/// `show ip interface brief` output with `rows` interfaces.
fn interface_brief(rows: usize) -> String {
    let mut out = String::from(
        "Interface                  IP-Address      OK? Method Status                Protocol\n",
    );
    for idx in 0..rows {
        let status = if idx % 7 == 0 { "administratively down" } else { "up" };
        out.push_str(&format!(
            "GigabitEthernet0/{:<10} 10.{}.{}.1     YES NVRAM  {:<21} up\n",
            idx,
            idx / 256,
            idx % 256,
            status
        ));
    }
    out
}

/// Template compile cost, paid once per engine call.
fn bench_compile(c: &mut Criterion) {
    c.bench_function("textfsm_compile", |b| {
        b.iter(|| TextFsm::new(black_box(TEXTFSM_IP_INTERFACE_BRIEF)).unwrap());
    });
}

fn bench_parse(c: &mut Criterion) {
    let fsm = TextFsm::new(TEXTFSM_IP_INTERFACE_BRIEF).unwrap();
    let mut group = c.benchmark_group("textfsm_parse");

    for rows in [10, 100, 1_000, 10_000].iter() {
        let input = interface_brief(*rows);
        group.throughput(Throughput::Bytes(input.len() as u64));
        group.bench_with_input(BenchmarkId::new("interface_brief", rows), &input, |b, input| {
            b.iter(|| black_box(fsm.parse_text(black_box(input)).unwrap()));
        });
    }

    group.bench_function("builtin_example", |b| {
        b.iter(|| black_box(fsm.parse_text(black_box(IP_INTERFACE_BRIEF)).unwrap()));
    });

    group.finish();
}

criterion_group!(benches, bench_compile, bench_parse);
criterion_main!(benches);
