//! Protobuf messages of the `componet.graph` package.
//!
//! ```proto
//! syntax = "proto3";
//! package componet.graph;
//!
//! enum Affix { PREFIX = 0; SUFFIX = 1; }
//!
//! message Axis {
//!   repeated double data = 1;
//!   optional Affix affix = 2;
//!   optional string unit = 3;
//!   string name = 4;
//!   string shortname = 5;
//!   optional bool computed = 6;
//! }
//!
//! message Component {
//!   string category = 1;
//!   repeated Axis axes = 2;
//!   repeated string mpns = 3;
//!   repeated string manufacturers = 4;
//!   string year = 5;
//! }
//!
//! message Components { repeated Component components = 1; }
//! ```
//!
//! Tags 1-4 of `Axis` and `Component` are the first schema version; the
//! later tags are additions that version-1 readers skip.

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum WireAffix {
    Prefix = 0,
    Suffix = 1,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct WireAxis {
    /// Packed: proto3 packs repeated scalars.
    #[prost(double, repeated, tag = "1")]
    pub data: Vec<f64>,
    #[prost(enumeration = "WireAffix", optional, tag = "2")]
    pub affix: Option<i32>,
    #[prost(string, optional, tag = "3")]
    pub unit: Option<String>,
    #[prost(string, tag = "4")]
    pub name: String,
    #[prost(string, tag = "5")]
    pub shortname: String,
    #[prost(bool, optional, tag = "6")]
    pub computed: Option<bool>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct WireComponent {
    #[prost(string, tag = "1")]
    pub category: String,
    #[prost(message, repeated, tag = "2")]
    pub axes: Vec<WireAxis>,
    #[prost(string, repeated, tag = "3")]
    pub mpns: Vec<String>,
    #[prost(string, repeated, tag = "4")]
    pub manufacturers: Vec<String>,
    #[prost(string, tag = "5")]
    pub year: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct WireComponents {
    #[prost(message, repeated, tag = "1")]
    pub components: Vec<WireComponent>,
}
