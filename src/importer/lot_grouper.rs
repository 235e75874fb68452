// ==========================================
// 检查排程系统 - 批次分组
// ==========================================
// 职责: 批次行 → (纳期, 品番) 单位的出荷不足记录
// 规则:
//   - 不足数取组内最小值 (负数表示不足), 为 0 的组丢弃
//   - 批次按数量降序累加, 直到覆盖不足数的绝对值 (至少一批)
//   - 批次合计 = min(累计, 不足数绝对值)
//   - 纳期无法解析的行不参与分组
// ==========================================

use crate::domain::shortage::ShortageRecord;
use crate::engine::diagnostics::{DiagnosticKind, DiagnosticsSink, Stage};
use chrono::NaiveDate;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::instrument;

pub struct LotGrouper {
    sink: Arc<dyn DiagnosticsSink>,
}

impl LotGrouper {
    pub fn new(sink: Arc<dyn DiagnosticsSink>) -> Self {
        Self { sink }
    }

    /// 分组 (结果按纳期、品番升序)
    #[instrument(skip(self, rows), fields(rows = rows.len()))]
    pub fn group(&self, rows: Vec<ShortageRecord>) -> Vec<ShortageRecord> {
        let mut groups: BTreeMap<(NaiveDate, String), Vec<ShortageRecord>> = BTreeMap::new();
        let mut undated = 0usize;

        for row in rows {
            match row.due_date {
                Some(due) => groups.entry((due, row.part_code.clone())).or_default().push(row),
                None => undated += 1,
            }
        }

        if undated > 0 {
            self.sink.emit(
                DiagnosticKind::MalformedValue,
                Stage::Import,
                format!("出荷不足: {} 行纳期无效, 不参与分组", undated),
            );
        }

        let mut zero_groups = 0usize;
        let grouped: Vec<ShortageRecord> = groups
            .into_values()
            .filter_map(|members| {
                let record = collapse(members);
                if record.is_none() {
                    zero_groups += 1;
                }
                record
            })
            .collect();

        if zero_groups > 0 {
            self.sink.emit(
                DiagnosticKind::Info,
                Stage::Import,
                format!("出荷不足: 丢弃 {} 个不足数为 0 的分组", zero_groups),
            );
        }

        tracing::debug!(groups = grouped.len(), "批次分组完成");
        grouped
    }
}

/// 一组批次行 → 一条记录; 不足数为 0 → None
fn collapse(members: Vec<ShortageRecord>) -> Option<ShortageRecord> {
    // 不足数最小的行 (同值取先出现者)
    let anchor = members.iter().fold(None::<&ShortageRecord>, |best, row| match best {
        Some(b) if b.shortage_qty <= row.shortage_qty => Some(b),
        _ => Some(row),
    })?;

    if anchor.shortage_qty == 0.0 {
        return None;
    }
    let required = anchor.shortage_qty.abs();

    let mut lots: Vec<&ShortageRecord> = members.iter().filter(|r| r.lot_qty.is_some()).collect();
    lots.sort_by(|a, b| {
        b.lot_qty
            .partial_cmp(&a.lot_qty)
            .unwrap_or(Ordering::Equal)
    });

    let mut cumulative = 0.0;
    let mut selected: Vec<&ShortageRecord> = Vec::new();
    for lot in lots {
        selected.push(lot);
        cumulative += lot.lot_qty.unwrap_or(0.0);
        if cumulative >= required {
            break;
        }
    }

    let lot_ids: Vec<&str> = selected.iter().filter_map(|r| r.lot_id.as_deref()).collect();
    let lot_qty = if selected.is_empty() {
        None
    } else {
        Some(cumulative.min(required))
    };

    Some(ShortageRecord {
        due_date: anchor.due_date,
        part_code: anchor.part_code.clone(),
        shipment_qty: members[0].shipment_qty,
        shortage_qty: anchor.shortage_qty,
        lot_id: if lot_ids.is_empty() {
            None
        } else {
            Some(lot_ids.join(","))
        },
        lot_qty,
        current_process_number: anchor.current_process_number.clone(),
    })
}
