use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion, Throughput};

const CLASS: &str = r#"<?php
declare(strict_types=1);

namespace App\Billing;

use App\Contracts\{Clock, Ledger};
use function sprintf;

#[Service(shared: true)]
final class Invoice implements \JsonSerializable
{
    use HasTimestamps;

    private const PREFIX = 'INV-', WIDTH = 6;

    public private(set) int $total = 0;

    public string $label {
        get => sprintf('%s%0' . self::WIDTH . 'd', self::PREFIX, $this->number);
    }

    public function __construct(
        private readonly Clock $clock,
        private Ledger $ledger,
        public readonly int $number,
    ) {}

    public function add(LineItem ...$items): static
    {
        foreach ($items as $i => $item) {
            if ($item->quantity <= 0 && !$item->isCredit()) {
                throw new \InvalidArgumentException("line {$i} has no quantity");
            }
            $this->total += $item->price * $item->quantity ?? 0;
        }
        return $this;
    }

    public function status(): string
    {
        return match (true) {
            $this->total === 0 => 'empty',
            $this->total < 100_00, $this->total < 0 => 'small',
            default => 'regular',
        };
    }

    public function jsonSerialize(): array
    {
        return ['number' => $this->number, 'total' => $this->total, 'lines' => array_map(fn($l) => $l->id, $this->ledger->lines())];
    }
}
"#;

const TEMPLATE: &str = r#"<html>
<body>
<?php if ($user): ?>
  <h1>Hello, <?= htmlspecialchars($user->name) ?></h1>
  <ul>
  <?php foreach ($user->orders as $order): ?>
    <li><?= $order->id ?>: <?= number_format($order->total / 100, 2) ?></li>
  <?php endforeach; ?>
  </ul>
<?php else: ?>
  <a href="/login">Sign in</a>
<?php endif; ?>
</body>
</html>
"#;

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse");
    for (name, source) in [("class", CLASS), ("template", TEMPLATE)] {
        group.throughput(Throughput::Bytes(source.len() as u64));
        group.bench_function(name, |b| b.iter(|| phorge_parser::parse(black_box(source))));
    }
    group.finish();
}

fn bench_recovery(c: &mut Criterion) {
    let broken = CLASS.replace(';', "");
    c.bench_function("parse_broken", |b| {
        b.iter(|| phorge_parser::parse(black_box(&broken)))
    });
}

criterion_group!(benches, bench_parse, bench_recovery);
criterion_main!(benches);
