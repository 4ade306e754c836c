//! Bilingual (Chinese/colloquial -> English regulatory) term-expansion
//! groups, stage 1 of the query enhancer (§4.5).

use serde::{Deserialize, Serialize};

/// A group of surface forms that all expand to the same canonical
/// English regulatory term. Matching is bilateral: any variant in the
/// query (including the canonical form itself) triggers the group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TermGroup {
    pub canonical: String,
    pub variants: Vec<String>,
}

impl TermGroup {
    fn new(canonical: &str, variants: &[&str]) -> Self {
        Self {
            canonical: canonical.to_string(),
            variants: variants.iter().map(|v| v.to_string()).collect(),
        }
    }
}

/// Built-in term-expansion table. 58 groups, bilaterally indexed.
pub fn default_term_groups() -> Vec<TermGroup> {
    vec![
        TermGroup::new("liferaft", &["救生筏", "liferaft", "life raft"]),
        TermGroup::new("lifeboat", &["救生艇", "lifeboat"]),
        TermGroup::new("davit-launched", &["吊艇架", "起降落设备", "起落架", "davit-launched", "davit launched"]),
        TermGroup::new("free-fall lifeboat", &["自由降落式救生艇", "free-fall lifeboat", "free fall boat"]),
        TermGroup::new("fire control station", &["消防控制站", "fire control station"]),
        TermGroup::new("bulkhead", &["舱壁", "bulkhead"]),
        TermGroup::new("fire integrity", &["防火等级", "fire integrity", "fire rating"]),
        TermGroup::new("passageway", &["走廊", "通道", "passageway", "corridor"]),
        TermGroup::new("international voyage", &["国际航行", "international voyage"]),
        TermGroup::new("cargo ship", &["货船", "cargo ship"]),
        TermGroup::new("bulk carrier", &["散货船", "bulk carrier"]),
        TermGroup::new("tanker", &["油轮", "液货船", "tanker"]),
        TermGroup::new("passenger ship", &["客船", "passenger ship"]),
        TermGroup::new("gross tonnage", &["总吨位", "gross tonnage", "GT"]),
        TermGroup::new("length overall", &["总长", "船长", "length overall", "LOA"]),
        TermGroup::new("SOLAS", &["国际海上人命安全公约", "SOLAS"]),
        TermGroup::new("MARPOL", &["国际防止船舶污染公约", "MARPOL"]),
        TermGroup::new("FSS Code", &["消防安全系统规则", "FSS", "FSS Code"]),
        TermGroup::new("FTP Code", &["耐火试验程序规则", "FTP", "FTP Code"]),
        TermGroup::new("lifesaving appliance", &["救生设备", "LSA", "lifesaving appliance"]),
        TermGroup::new("classification society", &["船级社", "classification society"]),
        TermGroup::new("construction date", &["建造日期", "安放龙骨日期", "keel laying date"]),
        TermGroup::new("muster station", &["集合站", "muster station"]),
        TermGroup::new("embarkation station", &["登乘站", "embarkation station"]),
        TermGroup::new("immersion suit", &["浸水服", "immersion suit"]),
        TermGroup::new("EPIRB", &["应急无线电示位标", "EPIRB"]),
        TermGroup::new("SART", &["雷达应答器", "SART"]),
        TermGroup::new("watertight door", &["水密门", "watertight door"]),
        TermGroup::new("stability", &["稳性", "stability"]),
        TermGroup::new("damage stability", &["破损稳性", "damage stability"]),
        TermGroup::new("intact stability", &["完整稳性", "intact stability"]),
        TermGroup::new("ballast water", &["压载水", "ballast water"]),
        TermGroup::new("oil discharge", &["排油", "oil discharge"]),
        TermGroup::new("sewage", &["生活污水", "sewage"]),
        TermGroup::new("garbage management", &["垃圾管理", "garbage management"]),
        TermGroup::new("emission control area", &["排放控制区", "ECA"]),
        TermGroup::new("sulphur content", &["硫含量", "sulphur content"]),
        TermGroup::new("structural fire protection", &["结构防火", "structural fire protection"]),
        TermGroup::new("means of escape", &["逃生通道", "means of escape"]),
        TermGroup::new("watertight subdivision", &["水密分舱", "watertight subdivision"]),
        TermGroup::new("collision bulkhead", &["防撞舱壁", "collision bulkhead"]),
        TermGroup::new("machinery space", &["机舱", "machinery space"]),
        TermGroup::new("engine room", &["机器处所", "engine room"]),
        TermGroup::new("fixed fire-extinguishing system", &["固定灭火系统", "fixed fire-extinguishing system"]),
        TermGroup::new("portable fire extinguisher", &["手提式灭火器", "portable fire extinguisher"]),
        TermGroup::new("fire detection system", &["火灾探测系统", "fire detection system"]),
        TermGroup::new("fire door", &["防火门", "fire door"]),
        TermGroup::new("survey", &["检验", "survey"]),
        TermGroup::new("annual survey", &["年度检验", "annual survey"]),
        TermGroup::new("renewal survey", &["换证检验", "renewal survey"]),
        TermGroup::new("certificate of class", &["入级证书", "certificate of class"]),
        TermGroup::new("minimum dimension", &["最小尺寸", "minimum dimension"]),
        TermGroup::new("opening", &["开口", "opening"]),
        TermGroup::new("each side", &["两舷", "两边", "each side", "both sides"]),
        TermGroup::new("throw-overboard", &["抛投式", "throw-overboard"]),
        TermGroup::new("stern", &["船尾", "stern"]),
        TermGroup::new("COLREG", &["国际海上避碰规则", "COLREG"]),
        TermGroup::new("navigation light", &["航行灯", "navigation light"]),
        TermGroup::new("STCW", &["海员培训发证和值班标准公约", "STCW"]),
        TermGroup::new("oil tanker", &["油船", "oil tanker"]),
    ]
}
